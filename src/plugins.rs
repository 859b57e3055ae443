//! Named extension-point registry mirroring the source daemon's
//! `telescope_server/plugins/` package (manual buttons, LED, halt,
//! auto-track). Real GPIO edge-to-controller wiring is explicitly out of
//! scope for this daemon (spec §1: "Button/LED/halt side-plugins... treated
//! as a collaborator"), so each known name is just logged — this keeps
//! `--user-plugins` well defined without inventing a GPIO button driver.

pub const KNOWN_PLUGINS: &[&str] = &["manual", "led", "halt", "track"];

pub fn describe(name: &str) -> Option<&'static str> {
    match name {
        "manual" => Some("translates four button-pin edges into start_stop_motor calls"),
        "led" => Some("mirrors tracking/calibration state onto status LEDs"),
        "halt" => Some("translates a halt-button edge into a shutdown request"),
        "track" => Some("toggles tracking from a single button edge"),
        _ => None,
    }
}

pub fn log_requested(name: &str) {
    match describe(name) {
        Some(role) => tracing::info!(plugin = %name, role, "plugin requested but not bundled in this build"),
        None => tracing::warn!(plugin = %name, "unknown plugin name requested"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_known_plugin_has_a_description() {
        for name in KNOWN_PLUGINS {
            assert!(describe(name).is_some());
        }
    }

    #[test]
    fn unknown_plugin_name_has_no_description() {
        assert!(describe("gpio-fan").is_none());
    }
}
