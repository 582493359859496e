//! Responses to the SIMCom AT commands.

use atat::atat_derive::AtatResp;
use heapless::String;

#[derive(Clone, AtatResp)]
pub struct NoResponse;

/// `+CREG: <n>,<stat>[,<lac>,<ci>]`
#[derive(Clone, Debug, AtatResp)]
pub struct NetworkRegistration {
    #[at_arg(position = 0)]
    pub n: u8,
    #[at_arg(position = 1)]
    pub stat: u8,
    #[at_arg(position = 2)]
    pub lac: Option<String<8>>,
    #[at_arg(position = 3)]
    pub ci: Option<String<12>>,
}

/// `+CGATT: <state>`
#[derive(Clone, Debug, AtatResp)]
pub struct AttachState {
    #[at_arg(position = 0)]
    pub state: u8,
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Deserialize)]
pub enum PinStatusCode {
    #[serde(rename = "READY")]
    Ready,
    #[serde(rename = "SIM PIN")]
    SimPin,
    #[serde(rename = "SIM PUK")]
    SimPuk,
    #[serde(rename = "PH-SIM PIN")]
    PhSimPin,
    #[serde(rename = "SIM PIN2")]
    SimPin2,
    #[serde(rename = "SIM PUK2")]
    SimPuk2,
    #[serde(rename = "NOT INSERTED")]
    NotInserted,
    #[serde(rename = "NOT READY")]
    NotReady,
}

/// `+CPIN: <code>`
#[derive(Clone, Debug, AtatResp)]
pub struct PinStatus {
    #[at_arg(position = 0)]
    pub code: PinStatusCode,
}

/// Bare model line, e.g. `SIMCOM_SIM7000G`.
#[derive(Clone, Debug, AtatResp)]
pub struct ModelId {
    #[at_arg(position = 0)]
    pub model: String<32>,
}

/// `+CCLK: "yy/MM/dd,hh:mm:ss±zz"`, unquoted on the way in.
#[derive(Clone, Debug, AtatResp)]
pub struct NetworkTime {
    #[at_arg(position = 0)]
    pub time: String<32>,
}

/// `+CFUN: <fun>`, pushed after a functionality change.
#[derive(Clone, Debug, AtatResp)]
pub struct FunctionalityReport {
    #[at_arg(position = 0)]
    pub fun: u8,
}

/// `+PDP: DEACT`, the network dropped the bearer.
#[derive(Clone, Debug, AtatResp)]
pub struct PdpReport {
    #[at_arg(position = 0)]
    pub state: String<8>,
}
