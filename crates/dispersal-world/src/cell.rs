//! Cell state and the per-step transition rule.

use dispersal_core::{
    DriftVector, DynamicsConfig, Error, GeneticsConfig, Genotype, Position, Result, GENOTYPE_MAX,
    GENOTYPE_MIN,
};
use rand::seq::SliceRandom;
use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

/// Heritable state carried by an occupant of a genetic population
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lineage {
    pub genotype: Genotype,
    pub drift: DriftVector,
}

/// Occupancy of an active cell.
///
/// `Occupied(None)` is an occupant of a population without genetics.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Occupancy {
    #[default]
    Vacant,
    Occupied(Option<Lineage>),
}

/// How a cell comes to be occupied
#[derive(Debug, Clone, PartialEq)]
pub enum Descent {
    /// Occupant without genetics.
    Neutral,
    /// New lineage with the given genotype and a fresh random drift.
    Founder(Genotype),
    /// Offspring of a colonizing parent; drift is perturbed with noise.
    Inherited(Lineage),
}

/// Frozen public state of an active cell, tagged with its location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellInfo {
    pub location: Position,
    pub p_ext: f64,
    pub p_col: f64,
    pub occupied: bool,
    pub lineage: Option<Lineage>,
}

impl CellInfo {
    pub fn genotype(&self) -> Option<Genotype> {
        self.lineage.as_ref().map(|l| l.genotype)
    }
}

/// Result of one cell update. Applied to the grid by the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UpdateOutcome {
    pub colonized: Option<Position>,
    pub died: bool,
}

/// A single grid cell
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    active: bool,
    p_ext: f64,
    p_col: f64,
    occupancy: Occupancy,
}

impl Default for Cell {
    fn default() -> Self {
        Self::inactive()
    }
}

impl Cell {
    /// Placeholder for positions outside the habitable area
    pub fn inactive() -> Self {
        Self {
            active: false,
            p_ext: 0.0,
            p_col: 0.0,
            occupancy: Occupancy::Vacant,
        }
    }

    pub fn active(p_ext: f64, p_col: f64) -> Self {
        Self {
            active: true,
            p_ext,
            p_col,
            occupancy: Occupancy::Vacant,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_occupied(&self) -> bool {
        matches!(self.occupancy, Occupancy::Occupied(_))
    }

    pub fn p_ext(&self) -> f64 {
        self.p_ext
    }

    pub fn p_col(&self) -> f64 {
        self.p_col
    }

    pub fn lineage(&self) -> Option<&Lineage> {
        match &self.occupancy {
            Occupancy::Occupied(lineage) => lineage.as_ref(),
            Occupancy::Vacant => None,
        }
    }

    pub fn genotype(&self) -> Option<Genotype> {
        self.lineage().map(|l| l.genotype)
    }

    /// Occupy this cell, overwriting any current occupant
    pub fn become_occupied<R: Rng>(
        &mut self,
        descent: Descent,
        genetics: &GeneticsConfig,
        rng: &mut R,
    ) -> Result<()> {
        if !self.active {
            return Err(Error::InvalidState(
                "cannot occupy an inactive cell".to_string(),
            ));
        }

        let lineage = match descent {
            Descent::Neutral => None,
            Descent::Founder(genotype) => {
                let range = genetics.founder_drift_range;
                let drift = [
                    rng.gen_range(-range..=range),
                    rng.gen_range(-range..=range),
                    rng.gen_range(-range..=range),
                ];
                Some(Lineage {
                    genotype: clamp_genotype(genotype),
                    drift,
                })
            }
            Descent::Inherited(parent) => {
                let noise = Normal::new(0.0, genetics.drift_noise_std)
                    .map_err(|e| Error::Validation(format!("drift noise: {}", e)))?;
                let mut drift = parent.drift;
                for component in &mut drift {
                    *component += noise.sample(rng);
                }
                Some(Lineage {
                    genotype: parent.genotype,
                    drift,
                })
            }
        };

        self.occupancy = Occupancy::Occupied(lineage);
        Ok(())
    }

    /// Remove the occupant. A vacant cell is left as it is.
    pub fn become_extinct(&mut self) -> Result<()> {
        if !self.active {
            return Err(Error::InvalidState(
                "an inactive cell has no occupant to lose".to_string(),
            ));
        }
        self.occupancy = Occupancy::Vacant;
        Ok(())
    }

    /// Snapshot record for this cell, `None` if inactive
    pub fn get_info(&self, location: Position) -> Option<CellInfo> {
        if !self.active {
            return None;
        }
        Some(CellInfo {
            location,
            p_ext: self.p_ext,
            p_col: self.p_col,
            occupied: self.is_occupied(),
            lineage: self.lineage().cloned(),
        })
    }

    /// Advance an occupied cell by one step against frozen neighbor records.
    ///
    /// Only this cell's genotype is mutated; colonization and death are
    /// returned for the caller to apply. Random draws happen in a fixed
    /// order: target choice, colonization roll, extinction roll.
    pub fn update<R: Rng>(
        &mut self,
        neighbors: &[Option<&CellInfo>],
        genetics: &GeneticsConfig,
        dynamics: &DynamicsConfig,
        rng: &mut R,
    ) -> Result<UpdateOutcome> {
        if !self.active {
            return Err(Error::InvalidState(
                "update called on an inactive cell".to_string(),
            ));
        }
        let Occupancy::Occupied(lineage) = &mut self.occupancy else {
            return Err(Error::InvalidState(
                "update called on a vacant cell".to_string(),
            ));
        };

        if let Some(lineage) = lineage {
            drift_genotype(lineage, neighbors, genetics.alpha);
        }

        let candidates: Vec<&CellInfo> = neighbors
            .iter()
            .flatten()
            .copied()
            .filter(|info| !info.occupied)
            .collect();
        let colonized = match candidates.choose(rng) {
            Some(target) if rng.gen::<f64>() < target.p_col => Some(target.location),
            _ => None,
        };

        let mut p_death = self.p_ext;
        if colonized.is_some() {
            p_death += dynamics.colonization_hazard;
        }
        let died = rng.gen::<f64>() < p_death;

        Ok(UpdateOutcome { colonized, died })
    }
}

/// Blend toward the mean occupied-neighbor genotype, then apply scaled drift
fn drift_genotype(lineage: &mut Lineage, neighbors: &[Option<&CellInfo>], alpha: f64) {
    let mut sum = [0.0; 3];
    let mut count = 0usize;
    for genotype in neighbors
        .iter()
        .flatten()
        .filter(|info| info.occupied)
        .filter_map(|info| info.genotype())
    {
        for (total, component) in sum.iter_mut().zip(genotype) {
            *total += component;
        }
        count += 1;
    }

    for i in 0..3 {
        let own = lineage.genotype[i];
        let base = if count > 0 {
            (own + sum[i] / count as f64) / 2.0
        } else {
            own
        };
        lineage.genotype[i] = (base + lineage.drift[i] * alpha).clamp(GENOTYPE_MIN, GENOTYPE_MAX);
    }
}

fn clamp_genotype(genotype: Genotype) -> Genotype {
    genotype.map(|c| c.clamp(GENOTYPE_MIN, GENOTYPE_MAX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn occupied_cell(p_ext: f64, genotype: Genotype, drift: DriftVector) -> Cell {
        Cell {
            active: true,
            p_ext,
            p_col: 0.5,
            occupancy: Occupancy::Occupied(Some(Lineage { genotype, drift })),
        }
    }

    fn info(row: usize, col: usize, p_col: f64, lineage: Option<Lineage>) -> CellInfo {
        CellInfo {
            location: Position::new(row, col),
            p_ext: 0.0,
            p_col,
            occupied: lineage.is_some(),
            lineage,
        }
    }

    fn still_genetics() -> GeneticsConfig {
        GeneticsConfig {
            alpha: 1.0,
            drift_noise_std: 0.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_state_transitions() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let genetics = GeneticsConfig::default();

        let mut cell = Cell::active(0.1, 0.9);
        assert!(!cell.is_occupied());
        assert!(cell.get_info(Position::new(0, 0)).unwrap().lineage.is_none());

        cell.become_occupied(Descent::Founder([10.0, 20.0, 30.0]), &genetics, &mut rng)
            .unwrap();
        assert!(cell.is_occupied());
        assert_eq!(cell.genotype(), Some([10.0, 20.0, 30.0]));
        assert!(cell
            .lineage()
            .unwrap()
            .drift
            .iter()
            .all(|d| (-1.0..=1.0).contains(d)));

        cell.become_extinct().unwrap();
        assert!(!cell.is_occupied());
        assert!(cell.lineage().is_none());

        // Vacating twice is harmless
        cell.become_extinct().unwrap();
        assert_eq!(cell.p_ext(), 0.1);
        assert_eq!(cell.p_col(), 0.9);
    }

    #[test]
    fn test_inactive_cell_rejects_mutation() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut cell = Cell::inactive();

        assert!(cell.get_info(Position::new(3, 3)).is_none());
        assert!(matches!(
            cell.become_occupied(Descent::Neutral, &GeneticsConfig::default(), &mut rng),
            Err(Error::InvalidState(_))
        ));
        assert!(matches!(cell.become_extinct(), Err(Error::InvalidState(_))));
        assert!(cell
            .update(&[], &GeneticsConfig::default(), &DynamicsConfig::default(), &mut rng)
            .is_err());
    }

    #[test]
    fn test_update_requires_occupant() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut cell = Cell::active(0.5, 0.5);
        let result = cell.update(
            &[],
            &GeneticsConfig::default(),
            &DynamicsConfig::default(),
            &mut rng,
        );
        assert!(matches!(result, Err(Error::InvalidState(_))));
    }

    #[test]
    fn test_inherited_drift_is_perturbed() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let parent = Lineage {
            genotype: [50.0, 60.0, 70.0],
            drift: [0.5, -0.5, 0.0],
        };

        let mut cell = Cell::active(0.0, 1.0);
        cell.become_occupied(
            Descent::Inherited(parent.clone()),
            &GeneticsConfig::default(),
            &mut rng,
        )
        .unwrap();
        let child = cell.lineage().unwrap();
        assert_eq!(child.genotype, parent.genotype);
        assert_ne!(child.drift, parent.drift);

        // Without noise the drift is inherited exactly
        let mut cell = Cell::active(0.0, 1.0);
        cell.become_occupied(Descent::Inherited(parent.clone()), &still_genetics(), &mut rng)
            .unwrap();
        assert_eq!(cell.lineage(), Some(&parent));
    }

    #[test]
    fn test_neutral_occupant_has_no_lineage() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let mut cell = Cell::active(0.0, 1.0);
        cell.become_occupied(Descent::Neutral, &GeneticsConfig::default(), &mut rng)
            .unwrap();
        assert!(cell.is_occupied());
        assert!(cell.genotype().is_none());

        let outcome = cell
            .update(&[], &GeneticsConfig::default(), &DynamicsConfig::default(), &mut rng)
            .unwrap();
        assert!(!outcome.died);
        assert!(outcome.colonized.is_none());
    }

    #[test]
    fn test_genotype_without_neighbors_only_drifts() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut cell = occupied_cell(0.0, [100.0, 100.0, 100.0], [1.0, -2.0, 0.5]);

        cell.update(&[None, None], &still_genetics(), &DynamicsConfig::default(), &mut rng)
            .unwrap();
        assert_eq!(cell.genotype(), Some([101.0, 98.0, 100.5]));
    }

    #[test]
    fn test_genotype_blends_with_occupied_neighbors() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let mut cell = occupied_cell(0.0, [100.0, 100.0, 100.0], [0.0, 0.0, 0.0]);

        let a = info(0, 0, 0.0, Some(Lineage { genotype: [0.0, 50.0, 200.0], drift: [0.0; 3] }));
        let b = info(0, 1, 0.0, Some(Lineage { genotype: [40.0, 50.0, 100.0], drift: [0.0; 3] }));
        // Vacant neighbor does not contribute to the mean
        let c = info(0, 2, 0.0, None);

        cell.update(&[Some(&a), Some(&b), Some(&c)], &still_genetics(), &DynamicsConfig::default(), &mut rng)
            .unwrap();
        // mean = [20, 50, 150]; (own + mean) / 2
        assert_eq!(cell.genotype(), Some([60.0, 75.0, 125.0]));
    }

    #[test]
    fn test_genotype_clamped() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut cell = occupied_cell(0.0, [254.0, 1.0, 128.0], [10.0, -10.0, 0.0]);
        cell.update(&[], &still_genetics(), &DynamicsConfig::default(), &mut rng)
            .unwrap();
        assert_eq!(cell.genotype(), Some([255.0, 0.0, 128.0]));
    }

    #[test]
    fn test_certain_colonization_targets_vacant_neighbor() {
        let mut rng = ChaCha8Rng::seed_from_u64(6);
        let mut cell = occupied_cell(0.0, [1.0; 3], [0.0; 3]);

        let occupied = info(0, 0, 1.0, Some(Lineage { genotype: [1.0; 3], drift: [0.0; 3] }));
        let vacant = info(0, 1, 1.0, None);

        for _ in 0..50 {
            let outcome = cell
                .update(&[Some(&occupied), None, Some(&vacant)], &still_genetics(), &DynamicsConfig::default(), &mut rng)
                .unwrap();
            assert_eq!(outcome.colonized, Some(Position::new(0, 1)));
            assert!(!outcome.died);
        }
    }

    #[test]
    fn test_impossible_colonization() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut cell = occupied_cell(0.0, [1.0; 3], [0.0; 3]);
        let vacant = info(0, 1, 0.0, None);

        for _ in 0..50 {
            let outcome = cell
                .update(&[Some(&vacant)], &still_genetics(), &DynamicsConfig::default(), &mut rng)
                .unwrap();
            assert!(outcome.colonized.is_none());
        }
    }

    #[test]
    fn test_extinction_extremes() {
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let dynamics = DynamicsConfig::default();

        let mut doomed = occupied_cell(1.0, [1.0; 3], [0.0; 3]);
        let mut immortal = occupied_cell(0.0, [1.0; 3], [0.0; 3]);
        for _ in 0..100 {
            assert!(doomed.update(&[], &still_genetics(), &dynamics, &mut rng).unwrap().died);
            assert!(!immortal.update(&[], &still_genetics(), &dynamics, &mut rng).unwrap().died);
        }
    }

    #[test]
    fn test_colonization_hazard() {
        let mut rng = ChaCha8Rng::seed_from_u64(10);
        let vacant = info(0, 1, 1.0, None);
        let mut cell = occupied_cell(0.0, [1.0; 3], [0.0; 3]);

        let off = DynamicsConfig::default();
        let outcome = cell
            .update(&[Some(&vacant)], &still_genetics(), &off, &mut rng)
            .unwrap();
        assert!(outcome.colonized.is_some());
        assert!(!outcome.died);

        let on = DynamicsConfig {
            colonization_hazard: 1.0,
        };
        let outcome = cell
            .update(&[Some(&vacant)], &still_genetics(), &on, &mut rng)
            .unwrap();
        assert!(outcome.colonized.is_some());
        assert!(outcome.died);

        // No colonization, no penalty
        let outcome = cell.update(&[], &still_genetics(), &on, &mut rng).unwrap();
        assert!(!outcome.died);
    }

    fn arb_lineage() -> impl Strategy<Value = Lineage> {
        (
            prop::array::uniform3(0.0f64..=255.0),
            prop::array::uniform3(-50.0f64..50.0),
        )
            .prop_map(|(genotype, drift)| Lineage { genotype, drift })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn test_genotype_stays_in_range(
            own in arb_lineage(),
            neighbors in prop::collection::vec(prop::option::of(arb_lineage()), 0..8),
            alpha in 0.0f64..10.0,
            steps in 1usize..50,
            seed in any::<u64>(),
        ) {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let genetics = GeneticsConfig { alpha, ..Default::default() };
            let records: Vec<CellInfo> = neighbors
                .into_iter()
                .enumerate()
                .map(|(i, lineage)| info(0, i, 0.5, lineage))
                .collect();
            let views: Vec<Option<&CellInfo>> = records.iter().map(Some).collect();

            let mut cell = occupied_cell(0.0, own.genotype, own.drift);
            for _ in 0..steps {
                cell.update(&views, &genetics, &DynamicsConfig::default(), &mut rng).unwrap();
                let genotype = cell.genotype().unwrap();
                prop_assert!(genotype.iter().all(|c| (0.0..=255.0).contains(c)),
                    "genotype {:?} left [0, 255]", genotype);
            }
        }
    }
}
