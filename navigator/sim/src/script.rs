//! Scenario step parsing
//!
//! Steps are short `verb[:target[:priority]][=payload]` words, e.g.
//! `show:MainMenu`, `show:Level=forest-2`, `popup:Quit:5`, `back`.

use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, bail, Context};

/// One scripted navigation action
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Step {
    /// Navigate to a screen
    Show {
        screen: String,
        payload: Option<String>,
    },
    /// Navigate to a screen and clear history
    Clear { screen: String },
    /// Go back
    Back,
    /// Fade the HUD in
    Hud,
    /// Fade the HUD out
    NoHud,
    /// Show or queue a popup
    Popup {
        popup: String,
        priority: i32,
        payload: Option<String>,
    },
    /// Dismiss the visible popup
    Dismiss,
    /// Press the cancel control
    Cancel,
    /// Run frames without any request
    Wait { frames: u32 },
}

impl FromStr for Step {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let (head, payload) = match raw.split_once('=') {
            Some((head, payload)) => (head, Some(payload.to_owned())),
            None => (raw, None),
        };
        let mut parts = head.split(':');
        let verb = parts.next().unwrap_or_default();
        let mut target = || {
            parts
                .next()
                .filter(|t| !t.is_empty())
                .map(str::to_owned)
                .ok_or_else(|| anyhow!("step '{raw}' needs a target"))
        };

        let step = match verb {
            "show" => Self::Show {
                screen: target()?,
                payload,
            },
            "clear" => Self::Clear { screen: target()? },
            "back" => Self::Back,
            "hud" => Self::Hud,
            "nohud" => Self::NoHud,
            "popup" => {
                let popup = target()?;
                let priority = match parts.next() {
                    Some(p) => p
                        .parse()
                        .with_context(|| format!("invalid priority in step '{raw}'"))?,
                    None => 0,
                };
                Self::Popup {
                    popup,
                    priority,
                    payload,
                }
            }
            "dismiss" => Self::Dismiss,
            "cancel" => Self::Cancel,
            "wait" => {
                let frames = target()?
                    .parse()
                    .with_context(|| format!("invalid frame count in step '{raw}'"))?;
                Self::Wait { frames }
            }
            other => bail!("unknown step '{other}'"),
        };
        Ok(step)
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Show { screen, payload: Some(p) } => write!(f, "show:{screen}={p}"),
            Self::Show { screen, payload: None } => write!(f, "show:{screen}"),
            Self::Clear { screen } => write!(f, "clear:{screen}"),
            Self::Back => write!(f, "back"),
            Self::Hud => write!(f, "hud"),
            Self::NoHud => write!(f, "nohud"),
            Self::Popup { popup, priority, .. } => write!(f, "popup:{popup}:{priority}"),
            Self::Dismiss => write!(f, "dismiss"),
            Self::Cancel => write!(f, "cancel"),
            Self::Wait { frames } => write!(f, "wait:{frames}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_steps() {
        assert_eq!(
            "show:Level=forest-2".parse::<Step>().unwrap(),
            Step::Show {
                screen: "Level".to_owned(),
                payload: Some("forest-2".to_owned()),
            }
        );
        assert_eq!(
            "popup:Quit:5".parse::<Step>().unwrap(),
            Step::Popup {
                popup: "Quit".to_owned(),
                priority: 5,
                payload: None,
            }
        );
        assert_eq!("back".parse::<Step>().unwrap(), Step::Back);
        assert_eq!("wait:30".parse::<Step>().unwrap(), Step::Wait { frames: 30 });
    }

    #[test]
    fn test_reject_bad_steps() {
        assert!("show".parse::<Step>().is_err());
        assert!("popup:Quit:high".parse::<Step>().is_err());
        assert!("teleport:Moon".parse::<Step>().is_err());
    }
}
