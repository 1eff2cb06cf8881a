use enumset::enum_set;
use enumset::EnumSet;
use log::debug;
use log::warn;

use super::Detector;
use super::DetectorHook;
use super::DetectorOutcome;
use crate::basic_types::DetectorDefect;
use crate::blocksplit_assert_simple;
use crate::basic_types::TotalF64;
use crate::create_statistics_struct;
use crate::decomposition::DecompositionBuilder;
use crate::decomposition::Seeed;
use crate::model::ConstraintHandler;
use crate::model::ConstraintId;
use crate::model::IncidenceModel;
use crate::statistics::CumulativeMovingAverage;
use crate::statistics::Statistic;
use crate::statistics::StatisticLogger;

/// Constraints of the same color have the same handler and the same sides.
///
/// Colors are ordered by handler, then left-hand side, then right-hand side.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ColorKey {
    pub handler: ConstraintHandler,
    pub lhs: TotalF64,
    pub rhs: TotalF64,
}

impl ColorKey {
    pub fn of<M: IncidenceModel>(model: &M, constraint: ConstraintId) -> ColorKey {
        ColorKey {
            handler: model.handler_type(constraint).clone(),
            lhs: TotalF64::new(model.lhs(constraint)),
            rhs: TotalF64::new(model.rhs(constraint)),
        }
    }
}

/// The colors of a set of constraints.
#[derive(Clone, Debug)]
pub struct ColorClasses {
    /// The distinct colors, sorted.
    pub colors: Vec<ColorKey>,
    /// For every constraint, in the order they were given, the index of its color.
    pub constraint_colors: Vec<(ConstraintId, usize)>,
}

impl ColorClasses {
    pub fn of<M: IncidenceModel>(
        model: &M,
        constraints: impl IntoIterator<Item = ConstraintId>,
    ) -> ColorClasses {
        let keyed: Vec<(ConstraintId, ColorKey)> = constraints
            .into_iter()
            .map(|constraint| (constraint, ColorKey::of(model, constraint)))
            .collect();

        let mut colors: Vec<ColorKey> = keyed.iter().map(|(_, key)| key.clone()).collect();
        colors.sort();
        colors.dedup();

        let constraint_colors = keyed
            .into_iter()
            .map(|(constraint, key)| {
                let (Ok(color) | Err(color)) = colors.binary_search(&key);
                (constraint, color)
            })
            .collect();

        ColorClasses {
            colors,
            constraint_colors,
        }
    }

    pub fn num_colors(&self) -> usize {
        self.colors.len()
    }

    /// The constraints whose color is in `subset`.
    pub fn constraints_with_colors<'a>(
        &'a self,
        subset: &'a [usize],
    ) -> impl Iterator<Item = ConstraintId> + 'a {
        self.constraint_colors
            .iter()
            .filter(|(_, color)| subset.contains(color))
            .map(|(constraint, _)| *constraint)
    }
}

/// The largest number of colors [`enumerate_color_subsets`] can enumerate.
pub const MAX_ENUMERABLE_COLORS: usize = u64::BITS as usize - 1;

/// Enumerates the subsets of `0..num_colors` with between `min_size` and `max_size` elements.
///
/// Subsets are visited in the order of a binary counter over the colors, where color `i` is bit
/// `i`. Every subset is sorted. `num_colors` may be at most [`MAX_ENUMERABLE_COLORS`].
pub fn enumerate_color_subsets(
    num_colors: usize,
    min_size: usize,
    max_size: usize,
) -> impl Iterator<Item = Vec<usize>> {
    blocksplit_assert_simple!(
        num_colors <= MAX_ENUMERABLE_COLORS,
        "cannot enumerate the subsets of {num_colors} colors"
    );
    let num_colors = num_colors.min(MAX_ENUMERABLE_COLORS);
    (1_u64..(1_u64 << num_colors))
        .filter(move |mask| (min_size..=max_size).contains(&(mask.count_ones() as usize)))
        .map(move |mask| {
            (0..num_colors)
                .filter(|&color| mask & (1 << color) != 0)
                .collect()
        })
}

/// The options of the [`ColorClassDetector`].
#[derive(Clone, Copy, Debug)]
pub struct ColorClassOptions {
    pub min_subset_size: usize,
    pub max_subset_size: usize,
    /// When the open constraints have more colors than this, the detector does not run. Capped
    /// at [`MAX_ENUMERABLE_COLORS`].
    pub max_colors: usize,
}

impl Default for ColorClassOptions {
    fn default() -> Self {
        ColorClassOptions {
            min_subset_size: 2,
            max_subset_size: 2,
            max_colors: 20,
        }
    }
}

create_statistics_struct!(
    /// The statistics of the [`ColorClassDetector`].
    ColorClassStatistics {
        num_calls: usize,
        num_skipped_too_many_colors: usize,
        num_subsets_tried: usize,
        num_candidates: usize,
        average_num_colors: CumulativeMovingAverage<u64>,
    }
);

/// Tries every small subset of the color classes of the open constraints as the master.
///
/// For each subset, the open constraints of those colors go to the master and the remaining open
/// constraints are completed into blocks. A subset which leaves fewer than two blocks is no
/// structure.
#[derive(Debug, Default)]
pub struct ColorClassDetector {
    options: ColorClassOptions,
    statistics: ColorClassStatistics,
}

impl ColorClassDetector {
    pub fn new(mut options: ColorClassOptions) -> Self {
        if options.max_colors > MAX_ENUMERABLE_COLORS {
            warn!(
                "lowering the maximum of {} color classes to {MAX_ENUMERABLE_COLORS}",
                options.max_colors
            );
            options.max_colors = MAX_ENUMERABLE_COLORS;
        }

        ColorClassDetector {
            options,
            statistics: ColorClassStatistics::default(),
        }
    }

    pub fn statistics(&self) -> &ColorClassStatistics {
        &self.statistics
    }
}

impl<M: IncidenceModel> Detector<M> for ColorClassDetector {
    fn name(&self) -> &str {
        "color_classes"
    }

    fn hooks(&self) -> EnumSet<DetectorHook> {
        enum_set!(DetectorHook::Propagate)
    }

    fn log_statistics(&self, statistic_logger: StatisticLogger) {
        self.statistics.log(statistic_logger)
    }

    fn propagate_seeed(
        &mut self,
        model: &M,
        seeed: &Seeed,
    ) -> Result<DetectorOutcome, DetectorDefect> {
        if seeed.num_open_constraints() == 0 {
            return Ok(DetectorOutcome::DidNotRun);
        }

        let classes = ColorClasses::of(model, seeed.open_constraints());
        let num_colors = classes.num_colors();
        if num_colors > self.options.max_colors {
            warn!(
                "{num_colors} color classes exceed the maximum of {}, skipping",
                self.options.max_colors
            );
            self.statistics.num_skipped_too_many_colors += 1;
            return Ok(DetectorOutcome::DidNotRun);
        }

        self.statistics.num_calls += 1;
        self.statistics
            .average_num_colors
            .add_term(num_colors as u64);

        let mut candidates = Vec::new();
        for subset in enumerate_color_subsets(
            num_colors,
            self.options.min_subset_size,
            self.options.max_subset_size,
        ) {
            self.statistics.num_subsets_tried += 1;

            let mut child = seeed.child();
            for constraint in classes.constraints_with_colors(&subset) {
                child.set_master(constraint);
            }
            DecompositionBuilder::complete(model, &mut child);

            if child.num_blocks() < 2 {
                debug!(
                    "color subset {subset:?} leaves {} block(s), which is no structure",
                    child.num_blocks()
                );
                continue;
            }
            candidates.push(child);
        }

        if candidates.is_empty() {
            return Ok(DetectorOutcome::NotFound);
        }

        self.statistics.num_candidates += candidates.len();
        Ok(DetectorOutcome::Found(candidates))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::containers::StorageKey;
    use crate::decomposition::ConstraintAssignment;
    use crate::decomposition::SeeedId;
    use crate::model::test_models::binaries;
    use crate::model::test_models::linear;
    use crate::model::test_models::two_color_classes;
    use crate::model::Model;

    fn frozen_root(model: &Model) -> Seeed {
        let mut seeed = Seeed::new(model);
        seeed.freeze(SeeedId::create_from_index(0), None);
        seeed
    }

    #[test]
    fn four_colors_have_six_pairs() {
        let subsets: Vec<Vec<usize>> = enumerate_color_subsets(4, 2, 2).collect();

        assert_eq!(
            subsets,
            vec![
                vec![0, 1],
                vec![0, 2],
                vec![1, 2],
                vec![0, 3],
                vec![1, 3],
                vec![2, 3],
            ]
        );
    }

    #[test]
    fn subset_sizes_are_bounded() {
        assert_eq!(enumerate_color_subsets(4, 1, 4).count(), 15);
        assert_eq!(enumerate_color_subsets(3, 3, 3).count(), 1);
        assert_eq!(enumerate_color_subsets(0, 1, 2).count(), 0);
    }

    #[test]
    fn colors_are_sorted_by_handler_then_sides() {
        let (model, [c0, c1, c2, c3]) = two_color_classes();
        let classes = ColorClasses::of(&model, [c3, c2, c1, c0]);

        assert_eq!(classes.num_colors(), 2);
        assert!(classes.colors[0].lhs < classes.colors[1].lhs);
        assert_eq!(
            classes.constraint_colors,
            vec![(c3, 0), (c2, 0), (c1, 1), (c0, 1)]
        );
    }

    #[test]
    fn two_color_classes_are_not_found() {
        let (model, _) = two_color_classes();
        let mut detector = ColorClassDetector::default();

        let outcome = detector
            .propagate_seeed(&model, &frozen_root(&model))
            .unwrap();

        assert!(matches!(outcome, DetectorOutcome::NotFound));
        assert_eq!(detector.statistics().num_subsets_tried, 1);
    }

    #[test]
    fn single_block_candidates_are_not_found() {
        let (model, _) = two_color_classes();
        let mut detector = ColorClassDetector::new(ColorClassOptions {
            min_subset_size: 1,
            max_subset_size: 1,
            ..Default::default()
        });

        let outcome = detector
            .propagate_seeed(&model, &frozen_root(&model))
            .unwrap();

        assert!(matches!(outcome, DetectorOutcome::NotFound));
        assert_eq!(detector.statistics().num_subsets_tried, 2);
    }

    #[test]
    fn single_color_in_master_separates_blocks() {
        let mut model = Model::default();
        let x = binaries(&mut model, &["a", "b", "c", "d"]);
        let c0 = linear(&mut model, "c0", 1.0, 1.0, &[(x[0], 1.0), (x[1], 1.0)]);
        let c1 = linear(&mut model, "c1", 1.0, 1.0, &[(x[2], 1.0), (x[3], 1.0)]);
        let link = linear(
            &mut model,
            "link",
            f64::NEG_INFINITY,
            1.0,
            &[(x[0], 1.0), (x[2], 1.0)],
        );
        let mut detector = ColorClassDetector::new(ColorClassOptions {
            min_subset_size: 1,
            max_subset_size: 1,
            ..Default::default()
        });

        let outcome = detector
            .propagate_seeed(&model, &frozen_root(&model))
            .unwrap();
        let DetectorOutcome::Found(candidates) = outcome else {
            panic!("expected candidates");
        };

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].assignment(link), Some(ConstraintAssignment::Master));
        assert_eq!(candidates[0].blocks(), vec![vec![c0], vec![c1]]);
    }

    #[test]
    fn maximum_number_of_colors_is_capped() {
        let mut model = Model::default();
        let x = binaries(&mut model, &["a"]);
        for index in 0..=MAX_ENUMERABLE_COLORS {
            let _ = linear(
                &mut model,
                &format!("c{index}"),
                f64::NEG_INFINITY,
                index as f64,
                &[(x[0], 1.0)],
            );
        }

        let mut detector = ColorClassDetector::new(ColorClassOptions {
            max_colors: 100,
            ..Default::default()
        });
        assert_eq!(detector.options.max_colors, MAX_ENUMERABLE_COLORS);

        assert!(matches!(
            detector
                .propagate_seeed(&model, &frozen_root(&model))
                .unwrap(),
            DetectorOutcome::DidNotRun
        ));
        assert_eq!(detector.statistics().num_skipped_too_many_colors, 1);
    }

    #[test]
    fn too_many_colors_do_not_run() {
        let mut model = Model::default();
        let x = binaries(&mut model, &["a", "b", "c"]);
        for (index, rhs) in [1.0, 2.0, 3.0].into_iter().enumerate() {
            let _ = linear(
                &mut model,
                &format!("c{index}"),
                f64::NEG_INFINITY,
                rhs,
                &[(x[index], 1.0)],
            );
        }

        let mut detector = ColorClassDetector::new(ColorClassOptions {
            max_colors: 2,
            ..Default::default()
        });

        assert!(matches!(
            detector
                .propagate_seeed(&model, &frozen_root(&model))
                .unwrap(),
            DetectorOutcome::DidNotRun
        ));
        assert_eq!(detector.statistics().num_skipped_too_many_colors, 1);
    }
}
