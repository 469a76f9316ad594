//! The `microsoft/react-native` preset.
//!
//! Each profile starts from the previous one and overrides what changed.

use depalign_core::types::{CapabilityMap, DirectEntry, MetaEntry, PackageEntry, Preset};

/// Preset identifier
pub const PRESET_ID: &str = "microsoft/react-native";

fn direct(name: &str, version: &str) -> DirectEntry {
    DirectEntry::new(name, version)
}

fn set(profile: &mut CapabilityMap, capability: &str, entry: impl Into<PackageEntry>) {
    profile.insert(capability.to_string(), entry.into());
}

/// Entries that follow the same pattern in every profile
struct CoreVersions<'a> {
    react_native: &'a str,
    react: &'a str,
    cli: &'a str,
    metro: &'a str,
    babel_preset: DirectEntry,
    babel_transformer: DirectEntry,
    metro_config: Option<&'a str>,
}

fn set_core(profile: &mut CapabilityMap, versions: CoreVersions<'_>) {
    let mut react_native_caps = vec!["react"];
    if let Some(metro_config) = versions.metro_config {
        set(
            profile,
            "core/metro-config",
            direct("@react-native/metro-config", metro_config).dev_only(),
        );
        react_native_caps.push("core/metro-config");
    }
    let react_native = direct("react-native", versions.react_native)
        .with_capabilities(react_native_caps);

    set(profile, "react", direct("react", versions.react));
    set(
        profile,
        "react-dom",
        direct("react-dom", &format!("^{}", versions.react)).with_capabilities(["react"]),
    );
    set(
        profile,
        "react-test-renderer",
        direct("react-test-renderer", versions.react)
            .with_capabilities(["react"])
            .dev_only(),
    );

    set(profile, "core", react_native.clone());
    set(profile, "core-android", react_native.clone());
    set(profile, "core-ios", react_native);
    set(
        profile,
        "core-macos",
        direct("react-native-macos", versions.react_native).with_capabilities(["react"]),
    );
    set(
        profile,
        "core-windows",
        direct("react-native-windows", versions.react_native).with_capabilities(["core"]),
    );

    set(profile, "babel-preset-react-native", versions.babel_preset.dev_only());
    set(
        profile,
        "community/cli",
        direct("@react-native-community/cli", versions.cli)
            .with_capabilities(["community/cli-android", "community/cli-ios"])
            .dev_only(),
    );
    set(
        profile,
        "community/cli-android",
        direct("@react-native-community/cli-platform-android", versions.cli).dev_only(),
    );
    set(
        profile,
        "community/cli-ios",
        direct("@react-native-community/cli-platform-ios", versions.cli).dev_only(),
    );

    for package in ["metro", "metro-config", "metro-core", "metro-resolver", "metro-runtime"] {
        set(profile, package, direct(package, versions.metro).dev_only());
    }
    set(
        profile,
        "metro-react-native-babel-transformer",
        versions.babel_transformer.dev_only(),
    );
}

fn profile_0_69() -> CapabilityMap {
    let mut profile = CapabilityMap::new();
    set_core(
        &mut profile,
        CoreVersions {
            react_native: "^0.69.0",
            react: "18.0.0",
            cli: "^8.0.4",
            metro: "^0.70.1",
            babel_preset: direct("metro-react-native-babel-preset", "^0.70.3"),
            babel_transformer: direct("metro-react-native-babel-transformer", "^0.70.1"),
            metro_config: None,
        },
    );

    set(&mut profile, "animation", direct("react-native-reanimated", "^2.9.0"));
    set(&mut profile, "datetime-picker", direct("@react-native-community/datetimepicker", "^6.2.0"));
    set(&mut profile, "filesystem", direct("react-native-fs", "^2.18.0"));
    set(&mut profile, "gestures", direct("react-native-gesture-handler", "^2.5.0"));
    set(&mut profile, "hermes", direct("hermes-engine", "~0.11.0"));
    set(&mut profile, "jest", direct("jest", "^26.6.3").dev_only());
    set(&mut profile, "masked-view", direct("@react-native-masked-view/masked-view", "^0.2.7"));
    set(&mut profile, "modal", direct("react-native-modal", "^13.0.0"));
    set(&mut profile, "navigation/native", direct("@react-navigation/native", "^6.0.8"));
    set(
        &mut profile,
        "navigation/stack",
        direct("@react-navigation/stack", "^6.2.0").with_capabilities(["navigation/native"]),
    );
    set(&mut profile, "netinfo", direct("@react-native-community/netinfo", "^8.0.0"));
    set(&mut profile, "popover", direct("react-native-popover-view", "^5.0.0"));
    set(&mut profile, "safe-area", direct("react-native-safe-area-context", "^4.3.1"));
    set(&mut profile, "screens", direct("react-native-screens", "^3.14.1"));
    set(&mut profile, "sqlite", direct("react-native-sqlite-storage", "^6.0.1"));
    set(&mut profile, "storage", direct("@react-native-async-storage/async-storage", "^1.17.7"));
    set(&mut profile, "svg", direct("react-native-svg", "^12.3.0"));
    set(&mut profile, "test-app", direct("react-native-test-app", "^1.3.10").dev_only());
    set(&mut profile, "webview", direct("react-native-webview", "^11.23.0"));
    profile
}

fn profile_0_70() -> CapabilityMap {
    let mut profile = profile_0_69();
    set_core(
        &mut profile,
        CoreVersions {
            react_native: "^0.70.0",
            react: "18.1.0",
            cli: "^9.0.0",
            metro: "^0.72.1",
            babel_preset: direct("metro-react-native-babel-preset", "^0.72.1"),
            babel_transformer: direct("metro-react-native-babel-transformer", "^0.72.1"),
            metro_config: None,
        },
    );

    set(&mut profile, "animation", direct("react-native-reanimated", "^2.10.0"));
    set(&mut profile, "datetime-picker", direct("@react-native-community/datetimepicker", "^6.3.3"));
    set(&mut profile, "gestures", direct("react-native-gesture-handler", "^2.6.0"));
    // Bundled with react-native from here on
    set(&mut profile, "hermes", MetaEntry::default());
    set(&mut profile, "netinfo", direct("@react-native-community/netinfo", "^9.0.0"));
    set(&mut profile, "safe-area", direct("react-native-safe-area-context", "^4.4.1"));
    set(&mut profile, "screens", direct("react-native-screens", "^3.18.2"));
    set(&mut profile, "storage", direct("@react-native-async-storage/async-storage", "^1.17.10"));
    set(&mut profile, "test-app", direct("react-native-test-app", "^1.6.9").dev_only());
    profile
}

fn profile_0_73() -> CapabilityMap {
    let mut profile = profile_0_70();
    set_core(
        &mut profile,
        CoreVersions {
            react_native: "^0.73.0",
            react: "18.2.0",
            cli: "^12.1.1",
            metro: "^0.80.0",
            babel_preset: direct("@react-native/babel-preset", "^0.73.0"),
            babel_transformer: direct("@react-native/metro-babel-transformer", "^0.73.0"),
            metro_config: Some("^0.73.0"),
        },
    );

    set(&mut profile, "animation", direct("react-native-reanimated", "^3.6.0"));
    set(&mut profile, "gestures", direct("react-native-gesture-handler", "^2.14.0"));
    set(&mut profile, "jest", direct("jest", "^29.2.1").dev_only());
    set(&mut profile, "masked-view", direct("@react-native-masked-view/masked-view", "^0.3.0"));
    set(&mut profile, "navigation/native", direct("@react-navigation/native", "^6.1.9"));
    set(
        &mut profile,
        "navigation/stack",
        direct("@react-navigation/stack", "^6.3.20").with_capabilities(["navigation/native"]),
    );
    set(&mut profile, "netinfo", direct("@react-native-community/netinfo", "^11.0.1"));
    set(&mut profile, "safe-area", direct("react-native-safe-area-context", "^4.8.2"));
    set(&mut profile, "screens", direct("react-native-screens", "^3.28.0"));
    set(&mut profile, "storage", direct("@react-native-async-storage/async-storage", "^1.21.0"));
    set(&mut profile, "svg", direct("react-native-svg", "^14.0.0"));
    set(&mut profile, "test-app", direct("react-native-test-app", "^2.5.34").dev_only());
    set(&mut profile, "webview", direct("react-native-webview", "^13.6.1"));
    profile
}

fn profile_0_74() -> CapabilityMap {
    let mut profile = profile_0_73();
    set_core(
        &mut profile,
        CoreVersions {
            react_native: "^0.74.0",
            react: "18.2.0",
            cli: "^13.6.4",
            metro: "^0.80.3",
            babel_preset: direct("@react-native/babel-preset", "^0.74.0"),
            babel_transformer: direct("@react-native/metro-babel-transformer", "^0.74.0"),
            metro_config: Some("^0.74.0"),
        },
    );

    set(
        &mut profile,
        "core-visionos",
        direct("@callstack/react-native-visionos", "^0.74.0").with_capabilities(["react"]),
    );
    set(&mut profile, "netinfo", direct("@react-native-community/netinfo", "^11.3.1"));
    set(&mut profile, "screens", direct("react-native-screens", "^3.31.0"));
    set(&mut profile, "storage", direct("@react-native-async-storage/async-storage", "^1.22.3"));
    set(&mut profile, "svg", direct("react-native-svg", "^15.2.0"));
    set(&mut profile, "test-app", direct("react-native-test-app", "^3.5.0").dev_only());
    profile
}

/// Build the preset
pub fn preset() -> Preset {
    Preset::new(PRESET_ID)
        .with_profile("0.69", profile_0_69())
        .with_profile("0.70", profile_0_70())
        .with_profile("0.73", profile_0_73())
        .with_profile("0.74", profile_0_74())
}
