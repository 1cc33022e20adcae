//! Demonstration roster and opening task.

use brigade_core::{Kernel, KernelError};

/// Demo brigade: id, name, role.
pub const ROSTER: [(&str, &str, &str); 2] = [
    ("HARRY", "Harry Meier", "Gardemanger"),
    ("LUKAS", "Lukas", "Runner"),
];

/// Id of the opening task.
pub const DEMO_TASK: &str = "001";

/// Start the shift, register the roster, and open the demo task.
pub fn seed_demo(kernel: &Kernel) -> Result<(), KernelError> {
    kernel.start_shift();
    for (id, name, role) in ROSTER {
        kernel.register_member(id, name, role)?;
    }
    kernel.set_active_user(ROSTER[0].0)?;
    kernel.lifecycle().create_with_pins(
        DEMO_TASK,
        "MATJES WÄSSERN",
        5,
        Some("ALLERGEN: FISCH"),
        Some("HACCP: 12h WÄSSERN, < 4°C"),
    )?;
    Ok(())
}
