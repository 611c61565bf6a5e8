//! Model tier selection.
//!
//! Callers ask for a quality tier, not a concrete model. The catalog maps
//! the closed tier set onto configured upstream model identifiers, with
//! environment-driven overrides and a safe default, so deployments can
//! swap models without touching call sites.

/// Logical quality/cost level of a generation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelTier {
    Standard,
    Premium,
}

/// Default model when nothing is configured.
const DEFAULT_STANDARD_MODEL: &str = "gpt-4o-mini";

/// Environment override for the standard tier.
pub const STANDARD_MODEL_ENV: &str = "SKALD_STANDARD_MODEL";

/// Environment override for the premium tier.
pub const PREMIUM_MODEL_ENV: &str = "SKALD_PREMIUM_MODEL";

/// Tier-to-model mapping. Immutable after construction; resolution is a
/// pure lookup with no failure modes.
#[derive(Debug, Clone)]
pub struct ModelCatalog {
    standard: String,
    premium: String,
}

impl ModelCatalog {
    /// Build a catalog from explicit model ids.
    ///
    /// An unconfigured premium tier falls back to the standard model.
    pub fn new(standard: impl Into<String>, premium: Option<String>) -> Self {
        let standard = standard.into();
        let premium = premium.unwrap_or_else(|| standard.clone());
        Self { standard, premium }
    }

    /// Build a catalog from `SKALD_STANDARD_MODEL` / `SKALD_PREMIUM_MODEL`,
    /// falling back to the built-in default.
    pub fn from_env() -> Self {
        let standard =
            std::env::var(STANDARD_MODEL_ENV).unwrap_or_else(|_| DEFAULT_STANDARD_MODEL.to_owned());
        let premium = std::env::var(PREMIUM_MODEL_ENV).ok();
        Self::new(standard, premium)
    }

    /// Resolve a tier to its configured model id.
    pub fn resolve(&self, tier: ModelTier) -> &str {
        match tier {
            ModelTier::Standard => &self.standard,
            ModelTier::Premium => &self.premium,
        }
    }
}

impl Default for ModelCatalog {
    fn default() -> Self {
        Self::new(DEFAULT_STANDARD_MODEL, None)
    }
}
