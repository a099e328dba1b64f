use grasp_config::{StaticCriterion, load_toml};
use rstest::rstest;

const FULL: &str = r#"
[controller]
feedback_period_ms = 50
static_vel_threshold = 0.2
static_pos_threshold = 0.02
vel_filter_coeff = 0.3
pos_filter_coeff = 0.6
min_static_duration_ms = 150
static_criterion = "velocity"
clock_skew_tolerance_ms = 20

[safety]
max_attempt_ms = 5000

[sim]
contact_angle = [0.9, 1.0, 1.1]
sensor_period_ms = 5
status_period_ms = 10
position_noise = 0.001
mode_latency_reports = 2
seed = 42

[logging]
file = "grasp.log"
level = "debug"
rotation = "daily"
"#;

#[test]
fn accepts_full_config() {
    let cfg = load_toml(FULL).expect("parse TOML");
    cfg.validate().expect("valid config");
    assert_eq!(cfg.controller.static_criterion, StaticCriterion::Velocity);
    assert_eq!(cfg.controller.min_static_duration_ms, 150);
    assert_eq!(cfg.safety.max_attempt_ms, 5000);
    assert_eq!(cfg.sim.contact_angle, [0.9, 1.0, 1.1]);
    assert_eq!(cfg.logging.rotation.as_deref(), Some("daily"));
}

#[test]
fn partial_section_keeps_other_defaults() {
    let cfg = load_toml("[controller]\nstatic_pos_threshold = 0.01\n").unwrap();
    cfg.validate().unwrap();
    assert_eq!(cfg.controller.static_pos_threshold, 0.01);
    assert_eq!(cfg.controller.min_static_duration_ms, 100);
    assert_eq!(cfg.controller.clock_skew_tolerance_ms, 10);
    assert_eq!(cfg.sim.sensor_period_ms, 10);
}

#[rstest]
#[case("[controller]\nfeedback_period_ms = 0", "feedback_period_ms must be >= 1")]
#[case("[controller]\nstatic_pos_threshold = 0.0", "static_pos_threshold must be > 0")]
#[case("[controller]\nstatic_vel_threshold = -1.0", "static_vel_threshold must be > 0")]
#[case("[controller]\nvel_filter_coeff = 1.0", "vel_filter_coeff must be in [0.0, 1.0)")]
#[case("[controller]\npos_filter_coeff = -0.1", "pos_filter_coeff must be in [0.0, 1.0)")]
#[case("[controller]\nmin_static_duration_ms = 0", "min_static_duration_ms must be >= 1")]
#[case("[controller]\nmin_static_duration_ms = 600000", "unreasonably large")]
#[case("[controller]\nclock_skew_tolerance_ms = 5000", "clock_skew_tolerance_ms must be <= 1000")]
#[case("[safety]\nmax_attempt_ms = 100000000", "max_attempt_ms is unreasonably large")]
#[case("[sim]\nsensor_period_ms = 0", "sensor_period_ms must be >= 1")]
#[case("[sim]\ncontact_angle = [0.5, 0.0, 0.5]", "contact_angle entries must be in (0, pi]")]
#[case("[sim]\nposition_noise = -0.5", "position_noise must be >= 0")]
#[case("[logging]\nrotation = \"weekly\"", "never|daily|hourly")]
fn rejects_out_of_range_values(#[case] toml: &str, #[case] needle: &str) {
    let cfg = load_toml(toml).expect("parse TOML");
    let err = cfg.validate().expect_err("should be rejected");
    assert!(format!("{err}").contains(needle), "'{err}' lacks '{needle}'");
}

#[test]
fn unknown_criterion_fails_to_parse() {
    assert!(load_toml("[controller]\nstatic_criterion = \"torque\"").is_err());
}
