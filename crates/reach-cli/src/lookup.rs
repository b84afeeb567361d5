use reach_core::{AppConfig, Platform};
use reach_providers::ayrshare::{LookupProfile, LOOKUP_PLATFORMS};
use reach_providers::ProviderSet;

/// Looks up `username` and prints one row per platform found.
///
/// # Errors
///
/// Returns an error if the platform is unknown, Ayrshare is not configured,
/// or no platform returned data.
pub(crate) async fn run_lookup(
    config: &AppConfig,
    username: &str,
    platform: Option<&str>,
) -> anyhow::Result<()> {
    let platforms = match platform {
        Some(name) => vec![name.parse::<Platform>()?],
        None => LOOKUP_PLATFORMS.to_vec(),
    };

    let providers = ProviderSet::from_config(&config.providers)?;
    let result = providers
        .ayrshare()?
        .lookup_profiles(username, &platforms)
        .await?;

    println!(
        "{:<11}{:<24}{:>12}{:>12}  TIER",
        "PLATFORM", "USERNAME", "FOLLOWERS", "ENGAGEMENT"
    );
    for row in result.profiles.iter().map(format_row) {
        println!("{row}");
    }
    if !result.missing.is_empty() {
        let missing: Vec<&str> = result.missing.iter().map(|p| p.as_str()).collect();
        println!("no data: {}", missing.join(", "));
    }
    Ok(())
}

fn format_row(found: &LookupProfile) -> String {
    let profile = &found.profile;
    let rate = profile.engagement_rate();
    let engagement = if rate > 0.0 {
        format!("{:.2}%", rate * 100.0)
    } else {
        "-".to_string()
    };
    format!(
        "{:<11}{:<24}{:>12}{:>12}  {}",
        profile.platform.as_str(),
        profile.username,
        profile.follower_count,
        engagement,
        found.tier.label()
    )
}

#[cfg(test)]
mod tests {
    use reach_core::CreatorProfile;

    use super::*;

    #[test]
    fn row_shows_percentage_engagement_and_tier() {
        let mut profile = CreatorProfile::new(Platform::TikTok, "1", "acme");
        profile.follower_count = 48_000;
        profile.set_engagement_rate(0.034);
        let row = format_row(&LookupProfile::from(profile));
        assert!(row.starts_with("tiktok"));
        assert!(row.contains("48000"));
        assert!(row.contains("3.40%"));
    }

    #[test]
    fn row_without_engagement_uses_dash() {
        let profile = CreatorProfile::new(Platform::Instagram, "2", "quiet");
        let row = format_row(&LookupProfile::from(profile));
        assert!(row.contains(" -"));
    }
}
