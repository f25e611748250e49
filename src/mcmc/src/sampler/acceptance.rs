use std::fmt::{self, Display, Formatter};

/// Parameter blocks updated at each step of the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Block {
    OutcrossingRate,
    InbreedingHistory,
    AlleleFrequency,
    MaternalGenotype,
}

impl Block {
    pub const ALL: [Block; 4] = [Self::OutcrossingRate, Self::InbreedingHistory, Self::AlleleFrequency, Self::MaternalGenotype];

    fn index(self) -> usize {
        self as usize
    }
}

impl Display for Block {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::OutcrossingRate   => "outcrossing rate",
            Self::InbreedingHistory => "inbreeding history",
            Self::AlleleFrequency   => "allele frequency",
            Self::MaternalGenotype  => "maternal genotype",
        };
        f.write_str(name)
    }
}

/// Number of accepted proposals and total proposals, per parameter block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AcceptanceRates {
    counts: [(usize, usize); 4],
}

impl AcceptanceRates {
    pub fn record(&mut self, block: Block, accepted: bool) {
        let (accepts, proposals) = &mut self.counts[block.index()];
        *proposals += 1;
        if accepted {
            *accepts += 1;
        }
    }

    pub fn proposals(&self, block: Block) -> usize {
        self.counts[block.index()].1
    }

    pub fn accepted(&self, block: Block) -> usize {
        self.counts[block.index()].0
    }

    /// Proportion of accepted proposals. `None` if the block never proposed anything.
    pub fn rate(&self, block: Block) -> Option<f64> {
        match self.counts[block.index()] {
            (_, 0)                  => None,
            (accepts, proposals) => Some(accepts as f64 / proposals as f64),
        }
    }
}

impl Display for AcceptanceRates {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let rates = Block::ALL.iter().map(|block| match self.rate(*block) {
            Some(rate) => format!("{block}: {rate:.4} ({}/{})", self.accepted(*block), self.proposals(*block)),
            None       => format!("{block}: NA"),
        });
        write!(f, "{}", rates.collect::<Vec<_>>().join(" - "))
    }
}
