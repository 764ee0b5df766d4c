//! Stub simulations shared by the scenario tests

use std::time::Duration;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

use crate::error::ModelError;
use crate::model::{ParameterAssignment, ParameterDescriptor, ParameterSpace};
use crate::simulation::{Reporter, Simulation};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopAction {
    Bribe,
    NoBribe,
}

/// Toy precinct: every step each cop independently decides whether to bribe,
/// with a propensity that grows with the bribe and shrinks with the expected
/// punishment.
pub struct Precinct {
    cops: Vec<CopAction>,
    propensity: f64,
    rng: SmallRng,
}

impl Simulation for Precinct {
    type Action = CopAction;
    const PARAMETERS: &'static [&'static str] = &[
        "team_size",
        "rationality_of_agents",
        "jail_time",
        "prob_of_prosecution",
        "memory_size",
        "cost_complain",
        "penalty_citizen_prosecution",
        "jail_cost_factor",
        "citizen_complain_memory_discount_factor",
        "bribe_amount",
    ];

    fn build(assignment: &ParameterAssignment, seed: u64) -> Result<Self, ModelError> {
        let team_size = assignment.integer("team_size")?;
        let rationality = assignment.real("rationality_of_agents")?;
        let jail_time = assignment.integer("jail_time")? as f64;
        let prob = assignment.real("prob_of_prosecution")?;
        let memory = assignment.integer("memory_size")?.max(1) as f64;
        let cost_complain = assignment.real("cost_complain")?;
        let penalty = assignment.real("penalty_citizen_prosecution")?;
        let jail_cost = assignment.real("jail_cost_factor")?;
        let discount = assignment.real("citizen_complain_memory_discount_factor")?;
        let bribe = assignment.real("bribe_amount")?;

        if team_size <= 0 {
            return Err(ModelError::internal("team_size must be positive"));
        }

        let complaint_risk = cost_complain / (memory + discount);
        let expected_penalty = prob * (jail_time * jail_cost + penalty) + complaint_risk;
        let pull = bribe / (bribe + expected_penalty + 1.0);
        let propensity = (rationality * pull + (1.0 - rationality) * 0.5).clamp(0.0, 1.0);

        Ok(Self {
            cops: vec![CopAction::NoBribe; team_size as usize],
            propensity,
            rng: SmallRng::seed_from_u64(seed),
        })
    }

    fn step(&mut self) -> Result<(), ModelError> {
        for cop in &mut self.cops {
            *cop = if self.rng.random::<f64>() < self.propensity {
                CopAction::Bribe
            } else {
                CopAction::NoBribe
            };
        }
        Ok(())
    }

    fn agents(&self, category: &str) -> Box<dyn Iterator<Item = CopAction> + '_> {
        match category {
            "cop" => Box::new(self.cops.iter().copied()),
            _ => Box::new(std::iter::empty()),
        }
    }
}

pub fn bribery_space() -> ParameterSpace {
    ParameterSpace::new([
        ParameterDescriptor::integer("team_size", 5.0, 25.0),
        ParameterDescriptor::real("rationality_of_agents", 0.01, 0.99),
        ParameterDescriptor::integer("jail_time", 1.0, 15.0),
        ParameterDescriptor::real("prob_of_prosecution", 0.01, 0.99),
        ParameterDescriptor::integer("memory_size", 2.0, 20.0),
        ParameterDescriptor::real("cost_complain", 0.3, 60.0),
        ParameterDescriptor::real("penalty_citizen_prosecution", 0.0, 20.0),
        ParameterDescriptor::real("jail_cost_factor", 0.3, 35.0),
        ParameterDescriptor::real("citizen_complain_memory_discount_factor", 0.0, 35.0),
        ParameterDescriptor::real("bribe_amount", 0.0, 5.0),
    ])
    .unwrap()
}

/// Baseline configuration of the reference workflow. `bribe_amount` lies
/// outside its sampling range on purpose.
pub fn bribery_defaults(space: &ParameterSpace) -> ParameterAssignment {
    ParameterAssignment::from_pairs(
        space,
        [
            ("team_size", 10.0),
            ("rationality_of_agents", 0.75),
            ("jail_time", 4.0),
            ("prob_of_prosecution", 0.7),
            ("memory_size", 10.0),
            ("cost_complain", 3.0),
            ("penalty_citizen_prosecution", 5.0),
            ("jail_cost_factor", 5.0),
            ("citizen_complain_memory_discount_factor", 3.0),
            ("bribe_amount", 50.0),
        ],
    )
    .unwrap()
}

pub fn cop_reporters() -> Vec<Reporter<Precinct>> {
    vec![
        Reporter::count_in_state("Bribing", "cop", CopAction::Bribe),
        Reporter::count_in_state("NoBribing", "cop", CopAction::NoBribe),
    ]
}

/// Reports the same value whatever its inputs
pub struct Constant;

impl Simulation for Constant {
    type Action = CopAction;
    const PARAMETERS: &'static [&'static str] = &["team_size"];

    fn build(_assignment: &ParameterAssignment, _seed: u64) -> Result<Self, ModelError> {
        Ok(Constant)
    }

    fn step(&mut self) -> Result<(), ModelError> {
        Ok(())
    }

    fn agents(&self, _category: &str) -> Box<dyn Iterator<Item = CopAction> + '_> {
        Box::new(std::iter::repeat_n(CopAction::Bribe, 4))
    }
}

pub fn team_space() -> ParameterSpace {
    ParameterSpace::new([ParameterDescriptor::integer("team_size", 5.0, 25.0)]).unwrap()
}

/// `y = 3 x0 + x1`
pub struct Linear {
    pub x0: f64,
    pub x1: f64,
    noise: f64,
}

impl Simulation for Linear {
    type Action = CopAction;
    const PARAMETERS: &'static [&'static str] = &["x0", "x1"];

    fn build(assignment: &ParameterAssignment, _seed: u64) -> Result<Self, ModelError> {
        Ok(Self {
            x0: assignment.real("x0")?,
            x1: assignment.real("x1")?,
            noise: 0.0,
        })
    }

    fn step(&mut self) -> Result<(), ModelError> {
        Ok(())
    }

    fn agents(&self, _category: &str) -> Box<dyn Iterator<Item = CopAction> + '_> {
        Box::new(std::iter::empty())
    }
}

impl Linear {
    pub fn output(&self) -> f64 {
        3.0 * self.x0 + self.x1 + self.noise
    }
}

/// `Linear` with seeded measurement noise
pub struct NoisyLinear(Linear);

impl Simulation for NoisyLinear {
    type Action = CopAction;
    const PARAMETERS: &'static [&'static str] = Linear::PARAMETERS;

    fn build(assignment: &ParameterAssignment, seed: u64) -> Result<Self, ModelError> {
        let mut inner = Linear::build(assignment, seed)?;
        let mut rng = SmallRng::seed_from_u64(seed);
        let normal = Normal::new(0.0, 0.1).map_err(|e| ModelError::internal(e.to_string()))?;
        inner.noise = normal.sample(&mut rng);
        Ok(Self(inner))
    }

    fn step(&mut self) -> Result<(), ModelError> {
        Ok(())
    }

    fn agents(&self, _category: &str) -> Box<dyn Iterator<Item = CopAction> + '_> {
        Box::new(std::iter::empty())
    }
}

pub fn unit_space() -> ParameterSpace {
    ParameterSpace::new([
        ParameterDescriptor::real("x0", 0.0, 1.0),
        ParameterDescriptor::real("x1", 0.0, 1.0),
    ])
    .unwrap()
}

pub fn linear_reporter() -> Reporter<Linear> {
    Reporter::new("y", Linear::output)
}

pub fn noisy_reporter() -> Reporter<NoisyLinear> {
    Reporter::new("y", |m: &NoisyLinear| m.0.output())
}

/// Fails on step 2 whenever `x0 > 0.5`
pub struct Faulty {
    x0: f64,
    steps: usize,
}

impl Simulation for Faulty {
    type Action = CopAction;
    const PARAMETERS: &'static [&'static str] = Linear::PARAMETERS;

    fn build(assignment: &ParameterAssignment, _seed: u64) -> Result<Self, ModelError> {
        Ok(Self {
            x0: assignment.real("x0")?,
            steps: 0,
        })
    }

    fn step(&mut self) -> Result<(), ModelError> {
        if self.steps == 2 && self.x0 > 0.5 {
            return Err(ModelError::internal("jail overflow"));
        }
        self.steps += 1;
        Ok(())
    }

    fn agents(&self, _category: &str) -> Box<dyn Iterator<Item = CopAction> + '_> {
        Box::new(std::iter::empty())
    }
}

impl Faulty {
    pub fn steps(&self) -> usize {
        self.steps
    }
}

/// Sleeps far longer per step than any watchdog in the tests allows
pub struct Sluggish;

pub const SLUGGISH_STEP: Duration = Duration::from_millis(20);

impl Simulation for Sluggish {
    type Action = CopAction;
    const PARAMETERS: &'static [&'static str] = &["team_size"];

    fn build(_assignment: &ParameterAssignment, _seed: u64) -> Result<Self, ModelError> {
        Ok(Sluggish)
    }

    fn step(&mut self) -> Result<(), ModelError> {
        std::thread::sleep(SLUGGISH_STEP);
        Ok(())
    }

    fn agents(&self, _category: &str) -> Box<dyn Iterator<Item = CopAction> + '_> {
        Box::new(std::iter::empty())
    }
}

/// Gets stuck in its first step for far longer than a test is willing to wait
pub struct Stalled;

pub const STALL: Duration = Duration::from_secs(3);

impl Simulation for Stalled {
    type Action = CopAction;
    const PARAMETERS: &'static [&'static str] = &["team_size"];

    fn build(_assignment: &ParameterAssignment, _seed: u64) -> Result<Self, ModelError> {
        Ok(Stalled)
    }

    fn step(&mut self) -> Result<(), ModelError> {
        std::thread::sleep(STALL);
        Ok(())
    }

    fn agents(&self, _category: &str) -> Box<dyn Iterator<Item = CopAction> + '_> {
        Box::new(std::iter::empty())
    }
}

/// Finishes after `team_size` steps
pub struct ShortShift {
    remaining: i64,
}

impl ShortShift {
    pub fn remaining(&self) -> i64 {
        self.remaining
    }
}

impl Simulation for ShortShift {
    type Action = CopAction;
    const PARAMETERS: &'static [&'static str] = &["team_size"];

    fn build(assignment: &ParameterAssignment, _seed: u64) -> Result<Self, ModelError> {
        Ok(Self {
            remaining: assignment.integer("team_size")?,
        })
    }

    fn step(&mut self) -> Result<(), ModelError> {
        self.remaining -= 1;
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.remaining > 0
    }

    fn agents(&self, _category: &str) -> Box<dyn Iterator<Item = CopAction> + '_> {
        Box::new(std::iter::repeat_n(CopAction::NoBribe, self.remaining.max(0) as usize))
    }
}
