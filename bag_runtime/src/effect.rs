//! Effects are the outward half of an object's scripted action: running an
//! object yields a list of effects, and the runtime executes them against
//! the variable store, the device manager, the PDA director and the
//! collaborator hosts. Keeping actions data-first means the activation
//! pass never needs to hand mutable runtime access into an object.

use bag_script::ExprId;

use crate::pda::PdaMode;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Write a variable (declaring it if new).
    SetVariable { name: String, value: String },
    /// Activate `object` in `dst`, then deactivate it in `src`; rolled
    /// back if the second step fails.
    MoveObject {
        dst: String,
        src: String,
        object: String,
    },
    AddObject { dst: String, object: String },
    RemoveObject { src: String, object: String },
    /// Link traversal to another storage device.
    Navigate {
        target: String,
        fade_id: Option<i32>,
        closeup: bool,
    },
    PlaySound {
        handle: String,
        file: String,
        volume: i32,
        loops: i32,
    },
    StopSound { handle: String },
    PlayMovie {
        handle: String,
        file: String,
        asynch: bool,
    },
    /// Execute an assignment-bearing expression owned by `device`.
    RunExpression { device: String, expr: ExprId },
    ShowPda { mode: PdaMode },
    HidePda,
    HoldPda,
    RestorePda,
    /// Close the current storage device (return to the previous one).
    CloseDevice,
    /// Hand control to the modal host until dismissed.
    EventLoop { name: String },
}
