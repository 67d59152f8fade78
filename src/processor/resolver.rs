//! Entity sprite resolution: an ordered chain of strategies with a
//! guaranteed fallback.

use crate::model::PrefixRule;

/// One way of picking a sprite file for an entity login.
pub trait SpriteResolver {
    /// `None` means "no opinion", the next strategy is tried.
    fn resolve(&self, login: &str) -> Option<String>;
}

impl<F> SpriteResolver for F
where
    F: Fn(&str) -> Option<String>,
{
    fn resolve(&self, login: &str) -> Option<String> {
        self(login)
    }
}

/// Matches logins by prefix, first rule wins.
#[derive(Debug, Clone, Default)]
pub struct PrefixResolver {
    rules: Vec<PrefixRule>,
}

impl PrefixResolver {
    pub fn new(rules: Vec<PrefixRule>) -> Self {
        Self { rules }
    }
}

impl SpriteResolver for PrefixResolver {
    fn resolve(&self, login: &str) -> Option<String> {
        self.rules
            .iter()
            .find(|r| login.starts_with(r.prefix.as_str()))
            .map(|r| r.sprite.clone())
    }
}

#[derive(Default)]
pub struct ResolverChain {
    strategies: Vec<Box<dyn SpriteResolver>>,
}

impl std::fmt::Debug for ResolverChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolverChain")
            .field("strategies", &self.strategies.len())
            .finish()
    }
}

impl ResolverChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Chain holding just the login-prefix rules.
    pub fn from_prefixes(rules: &[PrefixRule]) -> Self {
        Self::new().with(PrefixResolver::new(rules.to_vec()))
    }

    pub fn with(mut self, strategy: impl SpriteResolver + 'static) -> Self {
        self.push(strategy);
        self
    }

    /// Append a strategy, tried after the ones already present.
    pub fn push(&mut self, strategy: impl SpriteResolver + 'static) {
        self.strategies.push(Box::new(strategy));
    }

    /// Put a strategy in front of the existing ones.
    pub fn prepend(&mut self, strategy: impl SpriteResolver + 'static) {
        self.strategies.insert(0, Box::new(strategy));
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    /// First non-empty answer, else `fallback`.
    pub fn resolve(&self, login: &str, fallback: &str) -> String {
        self.strategies
            .iter()
            .find_map(|s| s.resolve(login).filter(|file| !file.is_empty()))
            .unwrap_or_else(|| fallback.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AssetsConfig;

    #[test]
    fn test_default_prefixes() {
        let chain = ResolverChain::from_prefixes(&AssetsConfig::default().sprite_prefixes);
        assert_eq!(chain.resolve("$rat1", "1128.png"), "1439.png");
        assert_eq!(chain.resolve("$stich_boss", "1128.png"), "1441.png");
        assert_eq!(chain.resolve("$wolf", "1128.png"), "1128.png");
        assert_eq!(chain.resolve("Player1", "1128.png"), "1128.png");
    }

    #[test]
    fn test_strategies_run_in_order() {
        let mut chain = ResolverChain::from_prefixes(&AssetsConfig::default().sprite_prefixes);
        chain.push(|login: &str| login.starts_with('$').then(|| "monster.png".to_string()));
        chain.prepend(|login: &str| (login == "$rat_king").then(|| "king.png".to_string()));

        assert_eq!(chain.len(), 3);
        assert_eq!(chain.resolve("$rat_king", "d.png"), "king.png");
        assert_eq!(chain.resolve("$rat2", "d.png"), "1439.png");
        assert_eq!(chain.resolve("$wolf", "d.png"), "monster.png");
        assert_eq!(chain.resolve("Hero", "d.png"), "d.png");
    }

    #[test]
    fn test_empty_answer_falls_through() {
        let chain = ResolverChain::new()
            .with(|_: &str| Some(String::new()))
            .with(|_: &str| Some("second.png".to_string()));
        assert_eq!(chain.resolve("x", "d.png"), "second.png");
        assert!(ResolverChain::new().is_empty());
        assert_eq!(ResolverChain::new().resolve("x", "d.png"), "d.png");
    }
}
