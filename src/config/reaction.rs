use crate::models::TargetKind;
use std::env;

/// Which target kinds reactions may be attached to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReactionConfig {
    pub allowed_targets: Vec<TargetKind>,
}

impl Default for ReactionConfig {
    fn default() -> Self {
        Self {
            allowed_targets: TargetKind::ALL.to_vec(),
        }
    }
}

impl ReactionConfig {
    pub fn new(allowed_targets: Vec<TargetKind>) -> Self {
        Self { allowed_targets }
    }

    /// `REACTION_TARGETS=posts,comments,users`
    pub fn from_env() -> Self {
        match env::var("REACTION_TARGETS") {
            Ok(raw) => {
                let (allowed, unknown) = parse_targets(&raw);
                for name in &unknown {
                    tracing::warn!("Ignoring unknown reaction target kind '{}'", name);
                }
                if allowed.is_empty() {
                    tracing::warn!(
                        "REACTION_TARGETS '{}' names no supported kind, using defaults",
                        raw
                    );
                    Self::default()
                } else {
                    Self::new(allowed)
                }
            }
            Err(_) => Self::default(),
        }
    }

    pub fn allows(&self, kind: TargetKind) -> bool {
        self.allowed_targets.contains(&kind)
    }
}

fn parse_targets(raw: &str) -> (Vec<TargetKind>, Vec<String>) {
    let mut allowed = Vec::new();
    let mut unknown = Vec::new();

    for item in raw.split(',') {
        let item = item.trim().to_ascii_lowercase();
        if item.is_empty() {
            continue;
        }
        match item.parse::<TargetKind>() {
            Ok(kind) if !allowed.contains(&kind) => allowed.push(kind),
            Ok(_) => {}
            Err(_) => unknown.push(item),
        }
    }

    (allowed, unknown)
}
