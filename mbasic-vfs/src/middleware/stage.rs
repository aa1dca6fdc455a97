//! Middleware execution stage

/// Execution stage for middleware
///
/// Stages are ordered by priority. Lower numbers execute first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Stage {
    /// Outer layer: logging, tracing
    #[default]
    Outer = 100,
    /// Name mapping: rewrite names before they reach the backend
    Mapping = 300,
}

impl Stage {
    /// Get stage priority (lower = earlier)
    pub fn priority(&self) -> u32 {
        *self as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_order() {
        assert!(Stage::Outer.priority() < Stage::Mapping.priority());
        assert_eq!(Stage::default(), Stage::Outer);
    }
}
