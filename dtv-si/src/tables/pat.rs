//! Program Association Table (PAT).

use crate::error::SiError;
use crate::section::{table_id, SectionHeader};
use crate::tables::{open_section, SiTable};

/// One program entry of the PAT.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatProgram {
    /// Program number; 0 points at the network PID instead of a PMT.
    pub service_id: u16,
    /// PID of the PMT (or NIT for program 0).
    pub pid: u16,
}

/// Program Association Table, mapping service ids to PMT PIDs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pat {
    pub header: SectionHeader,
    pub programs: Vec<PatProgram>,
}

impl Pat {
    /// The network PID advertised via program number 0, if present.
    pub fn nit_pid(&self) -> Option<u16> {
        self.programs
            .iter()
            .find(|p| p.service_id == 0)
            .map(|p| p.pid)
    }
}

impl SiTable for Pat {
    const NAME: &'static str = "pat";

    fn matches(tid: u8) -> bool {
        tid == table_id::PAT
    }

    fn decode(buf: &[u8], existing: Option<Self>) -> Result<(usize, Self), SiError> {
        let (header, mut payload, consumed) = open_section(buf, Self::NAME, Self::matches)?;

        let mut table = existing.unwrap_or(Pat {
            header,
            programs: Vec::new(),
        });

        while payload.remaining() >= 4 {
            let service_id = payload.read_u16()?;
            let pid = payload.read_u16()? & 0x1FFF;
            table.programs.push(PatProgram { service_id, pid });
        }

        Ok((consumed, table))
    }

    fn header(&self) -> &SectionHeader {
        &self.header
    }
}
