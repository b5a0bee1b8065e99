//! Scene object runtime: world scripts are parsed into storage devices
//! full of typed scriptable objects, and a per-frame activation pass
//! decides which of them are live, attached and eligible to run their
//! scripted action based on conditions over the variable store.

pub mod effect;
pub mod error;
pub mod host;
pub mod manager;
pub mod object;
pub mod parser;
pub mod pda;
pub mod report;
pub mod runtime;
pub mod save;
pub mod storage;

pub use effect::Effect;
pub use error::RuntimeError;
pub use host::{AudioPlayer, Dismissal, Hosts, ModalHost, MoviePlayer, Renderer};
pub use manager::StorageDevManager;
pub use object::{BagObject, ObjectKind};
pub use parser::{ParseReport, ParseWarning};
pub use pda::{PdaDirector, PdaMode, PdaPos};
pub use runtime::BagRuntime;
pub use save::ObjectRecord;
pub use storage::{PassState, StorageDevice};
