//! Unsolicited result codes the SIMCom modem pushes between commands.
//!
//! Nothing subscribes to them yet; the digester needs them to keep
//! unsolicited lines out of command responses.

use atat::atat_derive::AtatUrc;

use super::responses::{FunctionalityReport, PdpReport};

#[derive(Clone, AtatUrc)]
pub enum Urc {
    #[at_urc("+CFUN")]
    Functionality(FunctionalityReport),
    #[at_urc("+PDP")]
    PdpDeactivated(PdpReport),
}
