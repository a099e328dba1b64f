#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(rows) = grasp_config::read_joint_trace(data) {
        assert!(rows.windows(2).all(|w| w[0].t < w[1].t));
    }
});
