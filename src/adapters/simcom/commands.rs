//! AT commands issued by the SIMCom driver.

use atat::atat_derive::AtatCmd;
use heapless::String;

use super::responses::{
    AttachState, ModelId, NetworkRegistration, NetworkTime, NoResponse, PinStatus,
};

/// `AT`, answered once the modem is awake.
#[derive(Clone, AtatCmd)]
#[at_cmd("", NoResponse, timeout_ms = 500)]
pub struct At;

#[derive(Clone, AtatCmd)]
#[at_cmd("E0", NoResponse)]
pub struct EchoOff;

/// `AT+CMEE=<mode>`; 2 selects verbose `+CME ERROR` text.
#[derive(Clone, AtatCmd)]
#[at_cmd("+CMEE", NoResponse)]
pub struct SetErrorReporting {
    #[at_arg(position = 0)]
    pub mode: u8,
}

#[derive(Clone, AtatCmd)]
#[at_cmd("+CRESET", NoResponse)]
pub struct Reset;

#[derive(Clone, AtatCmd)]
#[at_cmd("+CPOF", NoResponse, timeout_ms = 3000)]
pub struct PowerOff;

#[derive(Clone, AtatCmd)]
#[at_cmd("+CREG?", NetworkRegistration)]
pub struct GetNetworkRegistration;

#[derive(Clone, AtatCmd)]
#[at_cmd("+CGATT?", AttachState)]
pub struct GetAttachState;

/// Packet-domain attach (1) or detach (0).
#[derive(Clone, AtatCmd)]
#[at_cmd("+CGATT", NoResponse, timeout_ms = 75000)]
pub struct SetAttachState {
    #[at_arg(position = 0)]
    pub state: u8,
}

/// Preferred radio: 2 automatic, 13 GSM only, 38 LTE only, 51 GSM and LTE.
#[derive(Clone, AtatCmd)]
#[at_cmd("+CNMP", NoResponse)]
pub struct SetNetworkMode {
    #[at_arg(position = 0)]
    pub mode: u8,
}

/// LTE flavour: 1 CAT-M, 2 NB-IoT, 3 both.
#[derive(Clone, AtatCmd)]
#[at_cmd("+CMNB", NoResponse)]
pub struct SetPreferredMode {
    #[at_arg(position = 0)]
    pub mode: u8,
}

#[derive(Clone, AtatCmd)]
#[at_cmd("+CGDCONT", NoResponse)]
pub struct SetPdpContext {
    #[at_arg(position = 0)]
    pub cid: u8,
    #[at_arg(position = 1)]
    pub pdp_type: String<8>,
    #[at_arg(position = 2)]
    pub apn: String<32>,
}

impl SetPdpContext {
    /// IPv4 context `cid` on `apn`. `None` if the APN does not fit.
    pub fn ip(cid: u8, apn: &str) -> Option<Self> {
        Some(Self {
            cid,
            pdp_type: String::try_from("IP").ok()?,
            apn: String::try_from(apn).ok()?,
        })
    }
}

#[derive(Clone, AtatCmd)]
#[at_cmd("+CGACT", NoResponse, timeout_ms = 150000)]
pub struct SetPdpActivation {
    #[at_arg(position = 0)]
    pub state: u8,
    #[at_arg(position = 1)]
    pub cid: u8,
}

#[derive(Clone, AtatCmd)]
#[at_cmd("+CPIN?", PinStatus)]
pub struct GetPinStatus;

#[derive(Clone, AtatCmd)]
#[at_cmd("+CGMM", ModelId)]
pub struct GetModelId;

#[derive(Clone, AtatCmd)]
#[at_cmd("+CCLK?", NetworkTime)]
pub struct GetClock;

#[derive(Clone, AtatCmd)]
#[at_cmd("+CFUN", NoResponse, timeout_ms = 10000)]
pub struct SetFunctionality {
    #[at_arg(position = 0)]
    pub fun: u8,
}
