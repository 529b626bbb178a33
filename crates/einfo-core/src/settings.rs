//! Environment-driven settings.
//!
//! [`EnvInputs`] is a plain snapshot of the variables that matter, so the
//! derivation in [`Settings::from_inputs`] can be tested without touching the
//! process environment.
//!
//! | Variable | Effect |
//! |----------|--------|
//! | `TERM` | `dumb` anywhere in it grades the terminal as dumb and disables color |
//! | `INSIDE_EMACS` | with `TERM=eterm-color`, shifts the indicator one column left |
//! | `NO_COLOR` | any value disables color |
//! | `RC_NOCOLOR` | truthy disables color |
//! | `EINFO_QUIET` | truthy silences informational output |
//! | `EINFO_VERBOSE` | truthy enables the `v*` variants |
//! | `EINFO_CPR_TIMEOUT_MS` | overrides the cursor query timeout |

use std::env;
use std::time::Duration;

use crate::capability::GradeConfig;
use crate::cpr::CprConfig;

/// Raw environment values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvInputs {
    pub term: Option<String>,
    pub inside_emacs: Option<String>,
    pub no_color: Option<String>,
    pub rc_nocolor: Option<String>,
    pub quiet: Option<String>,
    pub verbose: Option<String>,
    pub cpr_timeout_ms: Option<String>,
}

impl EnvInputs {
    /// Read the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            term: env::var("TERM").ok(),
            inside_emacs: env::var("INSIDE_EMACS").ok(),
            no_color: env::var("NO_COLOR").ok(),
            rc_nocolor: env::var("RC_NOCOLOR").ok(),
            quiet: env::var("EINFO_QUIET").ok(),
            verbose: env::var("EINFO_VERBOSE").ok(),
            cpr_timeout_ms: env::var("EINFO_CPR_TIMEOUT_MS").ok(),
        }
    }
}

/// `yes`, `true`, `on` or `1`, in any case.
fn truthy(value: Option<&str>) -> bool {
    value.is_some_and(|v| {
        let v = v.trim();
        ["yes", "true", "on", "1"]
            .iter()
            .any(|t| v.eq_ignore_ascii_case(t))
    })
}

/// Resolved behavior switches and tunables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// `TERM` declares a dumb terminal.
    pub dumb_term: bool,
    /// Running in Emacs' `eterm-color` terminal.
    pub eterm: bool,
    pub color: bool,
    pub quiet: bool,
    pub verbose: bool,
    pub cpr: CprConfig,
    pub grade: GradeConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_inputs(&EnvInputs::default())
    }
}

impl Settings {
    /// Settings for the current process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_inputs(&EnvInputs::from_env())
    }

    /// Derive settings from an environment snapshot.
    #[must_use]
    pub fn from_inputs(env: &EnvInputs) -> Self {
        let term = env.term.as_deref().unwrap_or_default();
        let dumb_term = term.contains("dumb");
        let eterm = term == "eterm-color" && env.inside_emacs.is_some();
        let color =
            !dumb_term && env.no_color.is_none() && !truthy(env.rc_nocolor.as_deref());

        let mut cpr = CprConfig::default();
        if let Some(ms) = env
            .cpr_timeout_ms
            .as_deref()
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|&ms| ms > 0)
        {
            cpr = cpr.timeout(Duration::from_millis(ms));
        }

        Self {
            dumb_term,
            eterm,
            color,
            quiet: truthy(env.quiet.as_deref()),
            verbose: truthy(env.verbose.as_deref()),
            cpr,
            grade: GradeConfig::default(),
        }
    }

    /// Correction added to the indicator indent.
    #[must_use]
    pub const fn column_offset(&self) -> i32 {
        if self.eterm { -1 } else { 0 }
    }
}
