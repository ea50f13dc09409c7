//! Pure logic and data model for the ridgeline management-plane toolkit.
//!
//! Everything in this crate is I/O-free: wire models for the hardware
//! state manager (HSM) and the system layout service (SLS), the
//! inventory reconciliation engine, fixup candidate selection, BGP plan
//! derivation, and DNS reservation matching. The callers fetch JSON and
//! pass it in.

pub mod bgp;
pub mod cidr;
pub mod discovery;
pub mod dns;
pub mod fixup;
pub mod hsm;
pub mod locking;
pub mod report;
pub mod sls;
pub mod xname;
