pub mod relay;

pub use relay::{RelayBody, RelayReply, RelayService};
