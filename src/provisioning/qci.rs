use serde::{Deserialize, Serialize};
use std::fmt;

/// Standardized QoS class identifiers, values 1..=9.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Qci {
    GbrConvVoice = 1,
    GbrConvVideo = 2,
    GbrGaming = 3,
    GbrNonConvVideo = 4,
    NgbrIms = 5,
    NgbrVideoTcpOperator = 6,
    NgbrVoiceVideoGaming = 7,
    NgbrVideoTcpPremium = 8,
    NgbrVideoTcpDefault = 9,
}

impl Qci {
    pub const ALL: [Qci; 9] = [
        Qci::GbrConvVoice,
        Qci::GbrConvVideo,
        Qci::GbrGaming,
        Qci::GbrNonConvVideo,
        Qci::NgbrIms,
        Qci::NgbrVideoTcpOperator,
        Qci::NgbrVoiceVideoGaming,
        Qci::NgbrVideoTcpPremium,
        Qci::NgbrVideoTcpDefault,
    ];

    pub fn value(&self) -> u8 {
        *self as u8
    }

    pub fn is_gbr(&self) -> bool {
        self.value() <= 4
    }

    /// Lower is served first.
    pub fn priority(&self) -> u8 {
        match self {
            Qci::GbrConvVoice => 2,
            Qci::GbrConvVideo => 4,
            Qci::GbrGaming => 3,
            Qci::GbrNonConvVideo => 5,
            Qci::NgbrIms => 1,
            Qci::NgbrVideoTcpOperator => 6,
            Qci::NgbrVoiceVideoGaming => 7,
            Qci::NgbrVideoTcpPremium => 8,
            Qci::NgbrVideoTcpDefault => 9,
        }
    }

    pub fn packet_delay_budget_ms(&self) -> u16 {
        match self {
            Qci::GbrConvVoice => 100,
            Qci::GbrConvVideo => 150,
            Qci::GbrGaming => 50,
            Qci::GbrNonConvVideo => 300,
            Qci::NgbrIms => 100,
            Qci::NgbrVideoTcpOperator => 300,
            Qci::NgbrVoiceVideoGaming => 100,
            Qci::NgbrVideoTcpPremium => 300,
            Qci::NgbrVideoTcpDefault => 300,
        }
    }

    pub fn packet_error_loss_rate(&self) -> f64 {
        match self {
            Qci::GbrConvVoice => 1.0e-2,
            Qci::GbrConvVideo | Qci::GbrGaming | Qci::NgbrVoiceVideoGaming => 1.0e-3,
            _ => 1.0e-6,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Qci::GbrConvVoice => "GBR_CONV_VOICE",
            Qci::GbrConvVideo => "GBR_CONV_VIDEO",
            Qci::GbrGaming => "GBR_GAMING",
            Qci::GbrNonConvVideo => "GBR_NON_CONV_VIDEO",
            Qci::NgbrIms => "NGBR_IMS",
            Qci::NgbrVideoTcpOperator => "NGBR_VIDEO_TCP_OPERATOR",
            Qci::NgbrVoiceVideoGaming => "NGBR_VOICE_VIDEO_GAMING",
            Qci::NgbrVideoTcpPremium => "NGBR_VIDEO_TCP_PREMIUM",
            Qci::NgbrVideoTcpDefault => "NGBR_VIDEO_TCP_DEFAULT",
        }
    }
}

impl fmt::Display for Qci {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
