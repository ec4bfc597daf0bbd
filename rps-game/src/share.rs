use crate::{GameError, Result};
use reqwest::Url;
use serde::{Deserialize, Serialize};

/// Invite links for a game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareLinks {
    pub game_url: String,
    pub text: String,
    pub twitter: String,
    pub telegram: String,
    pub whatsapp: String,
    pub discord: String,
}

impl ShareLinks {
    pub fn new(base_url: &str, game_id: u64) -> Result<Self> {
        let game_url = format!("{}/game/{}", base_url.trim_end_matches('/'), game_id);
        Url::parse(&game_url).map_err(|e| invalid_url(&game_url, e))?;

        let text = format!("Join my Rock Paper Scissors game! 🎮\n\nGame ID: #{}\n\n", game_id);

        let twitter = with_params(
            "https://twitter.com/intent/tweet",
            &[("text", text.as_str()), ("url", game_url.as_str())],
        )?;
        let telegram = with_params(
            "https://t.me/share/url",
            &[("url", game_url.as_str()), ("text", text.as_str())],
        )?;
        let whatsapp = with_params(
            "https://wa.me/",
            &[("text", format!("{}{}", text, game_url).as_str())],
        )?;

        Ok(Self {
            game_url,
            text,
            twitter,
            telegram,
            whatsapp,
            // discord has no share intent; the link is pasted into a channel
            discord: "https://discord.com/channels/@me".to_string(),
        })
    }
}

fn with_params(base: &str, params: &[(&str, &str)]) -> Result<String> {
    Url::parse_with_params(base, params)
        .map(String::from)
        .map_err(|e| invalid_url(base, e))
}

fn invalid_url(url: &str, err: impl std::fmt::Display) -> GameError {
    GameError::internal(format!("Invalid share URL {}: {}", url, err))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_game_url() {
        let links = ShareLinks::new("http://localhost:5173/", 42).unwrap();
        assert_eq!(links.game_url, "http://localhost:5173/game/42");
        assert!(links.text.contains("Game ID: #42"));
    }

    #[test]
    fn test_links_are_encoded() {
        let links = ShareLinks::new("http://localhost:5173", 42).unwrap();

        assert!(links.twitter.starts_with("https://twitter.com/intent/tweet?text="));
        assert!(links
            .twitter
            .contains("url=http%3A%2F%2Flocalhost%3A5173%2Fgame%2F42"));
        assert!(links.twitter.contains("%2342"));
        assert!(!links.twitter.contains('\n'));

        assert!(links.telegram.starts_with("https://t.me/share/url?url="));
        assert!(links.whatsapp.starts_with("https://wa.me/?text="));
        assert!(links.whatsapp.contains("game%2F42"));
        assert_eq!(links.discord, "https://discord.com/channels/@me");
    }

    #[test]
    fn test_bad_base_url() {
        assert!(ShareLinks::new("not a url", 1).is_err());
    }
}
