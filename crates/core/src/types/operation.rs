use std::fmt;

/// Execution mode of a Safe or MultiSend entry.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Operation {
    Call = 0,
    DelegateCall = 1,
}

impl Operation {
    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for Operation {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Operation::Call),
            1 => Ok(Operation::DelegateCall),
            other => Err(other),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Call => write!(f, "Call"),
            Operation::DelegateCall => write!(f, "DelegateCall"),
        }
    }
}
