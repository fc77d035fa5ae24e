use super::CommandDispatcher;
use crate::storage::UserProfile;
use crate::utils::feedback;
use crate::utils::logging::{log_command_start, log_command_success, log_validation_error};
use crate::utils::validation::{validate_code, SUPPORTED_LANGUAGES, SUPPORTED_REGIONS};

#[derive(Debug, Clone, Copy)]
enum LocaleField {
    Language,
    Region,
}

impl LocaleField {
    fn command(self) -> &'static str {
        match self {
            LocaleField::Language => "lang",
            LocaleField::Region => "region",
        }
    }

    fn kind(self) -> &'static str {
        match self {
            LocaleField::Language => "language",
            LocaleField::Region => "region",
        }
    }

    fn supported(self) -> &'static [&'static str] {
        match self {
            LocaleField::Language => SUPPORTED_LANGUAGES,
            LocaleField::Region => SUPPORTED_REGIONS,
        }
    }

    fn default_value(self, ctx: &CommandDispatcher) -> &str {
        match self {
            LocaleField::Language => &ctx.settings.language,
            LocaleField::Region => &ctx.settings.region,
        }
    }

    fn slot(self, profile: &mut UserProfile) -> &mut Option<String> {
        match self {
            LocaleField::Language => &mut profile.language,
            LocaleField::Region => &mut profile.region,
        }
    }
}

pub async fn handle_lang(ctx: &CommandDispatcher, user_id: i64, arg: &str) -> String {
    handle_locale(ctx, user_id, arg, LocaleField::Language).await
}

pub async fn handle_region(ctx: &CommandDispatcher, user_id: i64, arg: &str) -> String {
    handle_locale(ctx, user_id, arg, LocaleField::Region).await
}

async fn handle_locale(ctx: &CommandDispatcher, user_id: i64, arg: &str, field: LocaleField) -> String {
    let arg = arg.trim();
    let command = field.command();
    log_command_start(command, user_id, (!arg.is_empty()).then_some(arg));

    if arg.is_empty() {
        let mut profile = ctx.profile(user_id).await;
        let current = field.slot(&mut profile).clone();
        return feedback::info(&format!(
            "News {}: {}\n\nAvailable: {}. Change it with /{} <code> or reset with /{} default.",
            field.kind(),
            current.unwrap_or_else(|| format!("{} (default)", field.default_value(ctx))),
            field.supported().join(", "),
            command,
            command
        ));
    }

    let value = if arg.eq_ignore_ascii_case("default") {
        None
    } else {
        match validate_code(field.kind(), arg, field.supported()) {
            Ok(code) => Some(code),
            Err(e) => {
                log_validation_error(command, field.kind(), arg, &e.to_string(), user_id);
                return feedback::validation_error(&e.to_string(), &format!("Example: /{} {}", command, field.supported()[0]));
            }
        }
    };

    let changed = ctx
        .store
        .update(user_id, |profile| {
            let slot = field.slot(profile);
            let changed = *slot != value;
            *slot = value.clone();
            changed
        })
        .await;
    if changed {
        ctx.persist_after(command).await;
    }

    log_command_success(command, user_id, value.as_deref());
    match value {
        Some(code) => feedback::success(&format!("News {} set to {}.", field.kind(), code)),
        None => feedback::success(&format!(
            "News {} reset to the default ({}).",
            field.kind(),
            field.default_value(ctx)
        )),
    }
}
