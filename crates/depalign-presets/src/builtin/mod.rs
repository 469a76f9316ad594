//! Built-in presets

pub mod react_native;

use depalign_core::types::Preset;

/// Look up a built-in preset by identifier
pub fn builtin_preset(id: &str) -> Option<Preset> {
    match id {
        react_native::PRESET_ID => Some(react_native::preset()),
        _ => None,
    }
}

/// Identifiers of all built-in presets
pub fn builtin_preset_ids() -> Vec<&'static str> {
    vec![react_native::PRESET_ID]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_lookup() {
        for id in builtin_preset_ids() {
            let preset = builtin_preset(id).unwrap();
            assert_eq!(preset.id, id);
            assert!(!preset.is_empty());
        }
        assert!(builtin_preset("microsoft/unknown").is_none());
    }
}
