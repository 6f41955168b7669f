//! Check plugins. Each module exposes the section names it consumes together with its parse,
//! discovery and check functions.

pub mod hp_icf_xcvr;
pub mod ovirt;
pub mod puppet_agent;
pub mod sesam_backup_state;
