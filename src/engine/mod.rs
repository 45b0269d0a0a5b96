//! Runtime side: menus, parameter prompts and dispatch against a live
//! contract binding.
pub mod binding;
pub mod menu;
pub mod params;
pub mod reader;
pub mod session;

pub use binding::{ArgValue, CallOutcome, Capabilities, ContractBinding, DryRunBinding, TxReceipt};
pub use menu::{MenuAction, MenuItem, build_menu};
pub use reader::{LineReader, ScriptedReader, StdinReader};
pub use session::{Session, SessionOptions, SessionSummary};
