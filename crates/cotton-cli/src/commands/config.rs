use std::env;

use cotton_core::util::{is_http_url, is_ws_url};

use crate::cli::ConfigCommands;
use crate::config_profiles::{normalize_text_option, CliProfile, CliProfilesConfig};
use crate::error::CliError;

/// Values passed to `cotton config init`
#[derive(Debug, Clone, Default)]
pub struct ProfileInput {
    pub api_base_url: Option<String>,
    pub live_url: Option<String>,
    pub access_token: Option<String>,
    pub user_id: Option<i64>,
    pub username: Option<String>,
    pub nickname: Option<String>,
}

pub fn run_config(command: ConfigCommands, global_profile: Option<&str>) -> Result<(), CliError> {
    match command {
        ConfigCommands::Init {
            profile,
            api_base_url,
            live_url,
            access_token,
            user_id,
            username,
            nickname,
            no_activate,
        } => run_config_init(
            profile.as_deref().or(global_profile),
            ProfileInput {
                api_base_url,
                live_url,
                access_token,
                user_id,
                username,
                nickname,
            },
            no_activate,
        ),
    }
}

pub fn run_config_init(
    profile_name: Option<&str>,
    input: ProfileInput,
    no_activate: bool,
) -> Result<(), CliError> {
    let mut config = CliProfilesConfig::load().map_err(CliError::Config)?;
    let profile_name = config.resolve_profile_name(profile_name);

    let profile = config.profile_mut_or_default(&profile_name);
    merge_profile(profile, input);
    validate_profile_urls(profile)?;

    if !no_activate {
        config.active_profile = Some(profile_name.clone());
    }

    let path = config.save().map_err(CliError::Config)?;
    println!(
        "Profile '{}' initialized at {}",
        profile_name,
        path.display()
    );

    let profile = config
        .profiles
        .get(&profile_name)
        .ok_or_else(|| CliError::Config("Failed to persist profile".to_string()))?;
    let missing_fields = missing_fields(profile);
    if missing_fields.is_empty() {
        println!("Profile '{profile_name}' is ready. Run `cotton groups` to list conversations.");
    } else {
        println!(
            "Profile '{}' is missing: {}",
            profile_name,
            missing_fields.join(", ")
        );
    }

    Ok(())
}

/// Apply explicit values, then `COTTON_*` environment variables, over the existing profile
pub fn merge_profile(profile: &mut CliProfile, input: ProfileInput) {
    let api_base_url = normalize_text_option(input.api_base_url)
        .or_else(|| normalize_text_option(env::var("COTTON_API_BASE_URL").ok()));
    let live_url = normalize_text_option(input.live_url)
        .or_else(|| normalize_text_option(env::var("COTTON_LIVE_URL").ok()));
    let access_token = normalize_text_option(input.access_token)
        .or_else(|| normalize_text_option(env::var("COTTON_ACCESS_TOKEN").ok()));

    if let Some(value) = api_base_url {
        profile.api_base_url = Some(value.trim_end_matches('/').to_string());
    }
    if let Some(value) = live_url {
        profile.live_url = Some(value.trim_end_matches('/').to_string());
    }
    if let Some(value) = access_token {
        profile.access_token = Some(value);
    }
    if let Some(value) = input.user_id {
        profile.user_id = Some(value);
    }
    if let Some(value) = normalize_text_option(input.username) {
        profile.username = Some(value);
    }
    if let Some(value) = normalize_text_option(input.nickname) {
        profile.nickname = Some(value);
    }
}

pub fn missing_fields(profile: &CliProfile) -> Vec<&'static str> {
    let mut missing = Vec::new();
    if profile.api_base_url().is_none() {
        missing.push("api_base_url");
    }
    if profile.access_token().is_none() {
        missing.push("access_token");
    }
    if profile.user_id.is_none() {
        missing.push("user_id");
    }
    missing
}

pub fn validate_profile_urls(profile: &CliProfile) -> Result<(), CliError> {
    if let Some(url) = profile.api_base_url() {
        if !is_http_url(&url) {
            return Err(CliError::Config(
                "api_base_url must include http:// or https://".to_string(),
            ));
        }
    }
    if let Some(url) = profile.live_url() {
        if !is_ws_url(&url) {
            return Err(CliError::Config(
                "live_url must include ws:// or wss://".to_string(),
            ));
        }
    }
    Ok(())
}
