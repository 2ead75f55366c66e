use serde::{Deserialize, Serialize};

use crate::task::null_as_default;

pub const MAX_STARS: usize = 5;

/// A marketplace account, either the signed-in user or a task's creator.
/// The client only ever displays it.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct User {
    #[serde(default)]
    pub id: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub email: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub rating: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub created_tasks: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub completed_tasks: u64,
    #[serde(default)]
    pub about_me: Option<String>,
    #[serde(default)]
    pub socials: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

impl User {
    /// Number of filled stars out of [`MAX_STARS`].
    pub fn filled_stars(&self) -> usize {
        self.rating.clamp(0, MAX_STARS as i64) as usize
    }

    pub fn stars(&self) -> String {
        let filled = self.filled_stars();
        "★".repeat(filled) + &"☆".repeat(MAX_STARS - filled)
    }

    pub fn initial(&self) -> String {
        self.name
            .chars()
            .next()
            .map(|c| c.to_uppercase().collect())
            .unwrap_or_default()
    }

    pub fn social_links(&self) -> Vec<&str> {
        self.socials
            .as_deref()
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rated(rating: i64) -> User {
        User {
            rating,
            ..User::default()
        }
    }

    #[test]
    fn stars_are_clamped_to_five() {
        assert_eq!(rated(3).stars(), "★★★☆☆");
        assert_eq!(rated(9).stars(), "★★★★★");
        assert_eq!(rated(-2).stars(), "☆☆☆☆☆");
        assert_eq!(rated(0).filled_stars(), 0);
    }

    #[test]
    fn socials_split_on_commas() {
        let user = User {
            socials: Some("https://t.me/ann, https://github.com/ann,,".into()),
            ..User::default()
        };
        assert_eq!(
            user.social_links(),
            vec!["https://t.me/ann", "https://github.com/ann"]
        );
        assert!(User::default().social_links().is_empty());
    }

    #[test]
    fn initial_is_first_letter_uppercased() {
        let user = User {
            name: "ann".into(),
            ..User::default()
        };
        assert_eq!(user.initial(), "A");
        assert_eq!(User::default().initial(), "");
    }
}
