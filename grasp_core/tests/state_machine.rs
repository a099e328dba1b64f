use std::sync::Arc;
use std::time::Duration;

use grasp_core::mocks::RecordingCommander;
use grasp_core::{
    AbortReason, ControllerCfg, GraspController, GraspOutcome, GraspRequest, Phase, SafetyCfg,
};
use grasp_traits::Clock;
use grasp_traits::clock::test_clock::TestClock;
use grasp_traits::msg::{AxisCommand, HandMode, HandStatus, JointSample};
use rstest::rstest;

use HandMode::{ApproachVelocity as Approach, HoldEffort as Hold, Idle, Position};

struct Rig {
    ctl: GraspController<RecordingCommander>,
    clock: TestClock,
}

impl Rig {
    fn new() -> Self {
        Self::with_commander(RecordingCommander::default())
    }

    fn with_commander(commander: RecordingCommander) -> Self {
        let clock = TestClock::new();
        let ctl = GraspController::with_clock(
            "bhand",
            ControllerCfg::default(),
            commander,
            Arc::new(clock.clone()),
        );
        Self { ctl, clock }
    }

    fn status(&mut self, modes: [HandMode; 3]) -> Option<GraspOutcome> {
        self.ctl.on_status(&HandStatus::with_modes(modes))
    }

    /// Feed samples every 10 ms holding every joint at `pos` for `ms`.
    fn hold_still(&mut self, pos: f64, ms: u64) -> Option<GraspOutcome> {
        for _ in 0..=ms / 10 {
            self.clock.advance(Duration::from_millis(10));
            let s = JointSample {
                stamp: self.clock.now(),
                position: [pos; 8],
                velocity: [0.0; 8],
            };
            if let Some(o) = self.ctl.on_joint_state(&s) {
                return Some(o);
            }
        }
        None
    }

    fn sent_modes(&self) -> Vec<Option<HandMode>> {
        self.ctl
            .commander()
            .sent
            .iter()
            .map(|c| c.axes[0].mode())
            .collect()
    }

    /// Drive finger 1 to Holding.
    fn to_holding(&mut self) {
        self.ctl.accept(finger_one());
        assert_eq!(self.status([Approach, Idle, Idle]), None);
        assert_eq!(self.hold_still(0.7, 150), None);
        assert_eq!(self.status([Approach, Idle, Idle]), None);
        assert_eq!(self.status([Hold, Idle, Idle]), Some(GraspOutcome::Succeeded));
        assert_eq!(self.ctl.phase(), Some(Phase::Holding));
    }
}

fn finger_one() -> GraspRequest {
    GraspRequest::new([true, false, false], [1.5, 0.0, 0.0], [0.6, 0.0, 0.0]).unwrap()
}

#[test]
fn single_finger_grasp_progresses_to_holding() {
    let mut rig = Rig::new();
    assert_eq!(rig.ctl.accept(finger_one()), None);
    assert_eq!(rig.ctl.phase(), Some(Phase::Approaching));

    // Approach not yet confirmed
    assert_eq!(rig.status([Idle, Idle, Idle]), None);
    assert_eq!(rig.ctl.phase(), Some(Phase::Approaching));

    // Unused fingers' modes do not matter
    assert_eq!(rig.status([Approach, Idle, Position]), None);
    assert_eq!(rig.ctl.phase(), Some(Phase::Closing));
    let closing_since = rig.ctl.attempt().and_then(|a| a.closing_since());
    assert_eq!(closing_since, Some(rig.clock.now()));
    assert_eq!(rig.sent_modes(), vec![Some(Approach), Some(Approach)]);

    // Still moving: nothing published
    assert_eq!(rig.status([Approach, Idle, Idle]), None);
    assert_eq!(rig.ctl.commander().sent.len(), 2);

    assert_eq!(rig.hold_still(0.9, 150), None);
    assert!(rig.ctl.done_moving().unwrap().all_used(&[true, false, false]));
    assert_eq!(rig.status([Approach, Idle, Idle]), None);
    assert_eq!(rig.ctl.phase(), Some(Phase::Closing));
    let hold = rig.ctl.commander().last().copied().unwrap();
    assert_eq!(
        hold.axes[0],
        AxisCommand::Drive {
            mode: Hold,
            value: 0.6
        }
    );
    assert_eq!(
        hold.axes[1],
        AxisCommand::Drive {
            mode: HandMode::Unchanged,
            value: 0.0
        }
    );
    assert_eq!(hold.axes[3], AxisCommand::Ignore);

    let mut succeeded = 0;
    for _ in 0..5 {
        if rig.status([Hold, Idle, Idle]) == Some(GraspOutcome::Succeeded) {
            succeeded += 1;
        }
    }
    assert_eq!(succeeded, 1);
    assert_eq!(rig.ctl.phase(), Some(Phase::Holding));
    assert_eq!(rig.ctl.commander().sent.len(), 3);
}

#[test]
fn repeated_status_republishes_same_profile() {
    let mut rig = Rig::new();
    rig.ctl.accept(finger_one());
    for _ in 0..4 {
        assert_eq!(rig.status([Idle, Idle, Idle]), None);
        assert_eq!(rig.ctl.phase(), Some(Phase::Approaching));
    }
    let sent = &rig.ctl.commander().sent;
    assert_eq!(sent.len(), 4);
    assert!(sent.windows(2).all(|w| w[0] == w[1]));
}

#[test]
fn holding_ignores_samples_and_status() {
    let mut rig = Rig::new();
    rig.to_holding();
    let before = rig.ctl.commander().sent.len();
    assert_eq!(rig.hold_still(0.1, 50), None);
    assert_eq!(rig.status([Idle, Idle, Idle]), None);
    assert_eq!(rig.ctl.commander().sent.len(), before);
    assert_eq!(rig.ctl.phase(), Some(Phase::Holding));
}

#[test]
fn peer_preemption_in_holding_does_not_idle() {
    let mut rig = Rig::new();
    rig.to_holding();
    assert_eq!(
        rig.ctl.peer_preempt(),
        Some(GraspOutcome::Aborted(AbortReason::PeerPreempted))
    );
    assert!(!rig.ctl.is_active());
    assert_eq!(rig.status([Hold, Idle, Idle]), None);
    assert!(!rig.sent_modes().contains(&Some(Idle)));
}

#[test]
fn cancel_in_holding_idles_before_reporting() {
    let mut rig = Rig::new();
    rig.to_holding();
    rig.ctl.cancel();
    assert_eq!(rig.ctl.phase(), Some(Phase::Preempting));
    assert_eq!(rig.status([Hold, Idle, Idle]), None);
    assert_eq!(rig.status([Hold, Idle, Idle]), None);
    assert_eq!(rig.sent_modes().last(), Some(&Some(Idle)));
    assert_eq!(rig.status([Idle, Hold, Hold]), Some(GraspOutcome::Preempted));
    assert!(!rig.ctl.is_active());
}

#[rstest]
#[case::preempt(false, GraspOutcome::Preempted)]
#[case::abort(true, GraspOutcome::Aborted(AbortReason::Requested("operator stop".into())))]
fn idling_exit_reports_outcome_of_its_phase(#[case] abort: bool, #[case] expected: GraspOutcome) {
    let mut rig = Rig::new();
    rig.ctl.accept(finger_one());
    rig.status([Approach, Idle, Idle]);
    if abort {
        rig.ctl.abort("operator stop");
        assert_eq!(rig.ctl.phase(), Some(Phase::Aborting));
    } else {
        rig.ctl.cancel();
    }
    assert_eq!(rig.status([Approach, Idle, Idle]), None);
    assert_eq!(rig.status([Idle, Idle, Idle]), Some(expected));
    assert_eq!(rig.status([Idle, Idle, Idle]), None);
}

#[test]
fn clock_skew_aborts_and_later_samples_are_ignored() {
    let mut rig = Rig::new();
    rig.ctl.accept(finger_one());
    rig.hold_still(0.2, 30);
    let now = rig.clock.now();
    let ahead = JointSample {
        stamp: now + Duration::from_secs(1),
        position: [0.0; 8],
        velocity: [0.0; 8],
    };
    let outcome = rig.ctl.on_joint_state(&ahead).unwrap();
    let GraspOutcome::Aborted(reason) = outcome else {
        panic!("expected abort, got {outcome:?}");
    };
    assert_eq!(
        reason,
        AbortReason::ClockSkew {
            ahead: Duration::from_secs(1)
        }
    );
    assert!(reason.to_string().contains("in the future by 1 seconds"));
    assert!(!rig.ctl.is_active());
    assert_eq!(rig.ctl.on_joint_state(&ahead), None);
    assert_eq!(rig.hold_still(0.2, 30), None);
    assert_eq!(rig.status([Idle, Idle, Idle]), None);

    // A new request starts from scratch
    assert_eq!(rig.ctl.accept(finger_one()), None);
    assert_eq!(rig.ctl.phase(), Some(Phase::Approaching));
    assert!(!rig.ctl.done_moving().unwrap().all_used(&[true, false, false]));
}

#[test]
fn max_attempt_time_idles_then_aborts() {
    let clock = TestClock::new();
    let mut ctl = GraspController::with_clock(
        "bhand",
        ControllerCfg::default(),
        RecordingCommander::default(),
        Arc::new(clock.clone()),
    )
    .with_safety(SafetyCfg { max_attempt_ms: 200 });
    ctl.accept(finger_one());
    ctl.on_status(&HandStatus::with_modes([Approach, Idle, Idle]));
    clock.advance(Duration::from_millis(150));
    assert_eq!(ctl.phase(), Some(Phase::Closing));
    ctl.on_status(&HandStatus::with_modes([Approach, Idle, Idle]));
    assert_eq!(ctl.phase(), Some(Phase::Closing));

    clock.advance(Duration::from_millis(100));
    assert_eq!(ctl.on_status(&HandStatus::with_modes([Approach, Idle, Idle])), None);
    assert_eq!(ctl.phase(), Some(Phase::Aborting));
    assert_eq!(ctl.commander().last().and_then(|c| c.axes[0].mode()), Some(Idle));
    assert_eq!(
        ctl.on_status(&HandStatus::with_modes([Idle, Idle, Idle])),
        Some(GraspOutcome::Aborted(AbortReason::MaxRuntime))
    );
}

#[test]
fn publish_failures_do_not_stall_the_machine() {
    let mut rig = Rig::with_commander(RecordingCommander::failing());
    rig.ctl.accept(finger_one());
    assert_eq!(rig.status([Approach, Idle, Idle]), None);
    assert_eq!(rig.ctl.phase(), Some(Phase::Closing));
    assert_eq!(rig.ctl.commander().sent.len(), 1);
}

#[test]
fn feedback_tracks_phase_and_radii() {
    let mut rig = Rig::new();
    assert!(rig.ctl.feedback().is_none());
    rig.ctl.accept(finger_one());
    rig.hold_still(0.5, 40);
    let fb = rig.ctl.feedback().unwrap();
    assert_eq!(fb.phase, Phase::Approaching);
    assert_eq!(fb.elapsed, Duration::from_millis(50));
    let expected = grasp_core::radius(0.5, 0.5);
    assert!(fb.radii.iter().all(|r| (r - expected).abs() < 1e-12));
}
