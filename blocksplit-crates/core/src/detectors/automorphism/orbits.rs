use crate::basic_types::BlockUnionFind;
use crate::basic_types::DetectorDefect;
use crate::containers::KeyedVec;

/// Partition the nodes `0..num_points` into orbits under `generators`.
///
/// Every generator must map the points `0..num_points` among themselves. Orbits are numbered in
/// order of their smallest point; with `reorder_by_size`, larger orbits come first and orbits of
/// equal size keep that order.
pub(crate) fn point_orbits(
    num_points: usize,
    generators: &[Vec<usize>],
    reorder_by_size: bool,
) -> Result<Vec<Vec<usize>>, DetectorDefect> {
    let mut union_find = BlockUnionFind::with_blocks(num_points);

    for generator in generators {
        if generator.len() < num_points {
            return Err(DetectorDefect::LengthMismatch {
                what: "generator",
                expected: num_points,
                actual: generator.len(),
            });
        }

        for (point, &image) in generator.iter().enumerate().take(num_points) {
            if image == point {
                continue;
            }
            if image >= num_points {
                return Err(DetectorDefect::OrbitOutOfRange {
                    representative: image,
                    len: num_points,
                });
            }
            let _ = union_find.union(point, image);
        }
    }

    let mut labels: KeyedVec<usize, Option<usize>> = (0..num_points).map(Some).collect();
    let num_orbits = union_find.renumber_contiguous(&mut labels);

    let mut orbits = vec![Vec::new(); num_orbits];
    for (point, label) in labels.enumerate() {
        if let Some(orbit) = label {
            orbits[*orbit].push(point);
        }
    }

    if reorder_by_size {
        orbits.sort_by(|a, b| b.len().cmp(&a.len()));
    }

    Ok(orbits)
}

/// The distinct orbit sizes larger than one, together with the greatest common divisor of every
/// pair of them, sorted.
pub(crate) fn block_number_hints(orbit_sizes: impl IntoIterator<Item = usize>) -> Vec<usize> {
    let mut sizes: Vec<usize> = orbit_sizes.into_iter().filter(|&size| size > 1).collect();
    sizes.sort_unstable();
    sizes.dedup();

    let mut hints = sizes.clone();
    for (index, &a) in sizes.iter().enumerate() {
        for &b in &sizes[index + 1..] {
            let divisor = num::integer::gcd(a, b);
            if divisor > 1 {
                hints.push(divisor);
            }
        }
    }

    hints.sort_unstable();
    hints.dedup();
    hints
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orbits_follow_generators() {
        let generators = vec![vec![2, 1, 0, 3, 5, 4]];

        let orbits = point_orbits(4, &generators, false).unwrap();

        assert_eq!(orbits, vec![vec![0, 2], vec![1], vec![3]]);
    }

    #[test]
    fn larger_orbits_come_first() {
        let generators = vec![vec![0, 2, 3, 1, 5, 4]];

        let orbits = point_orbits(6, &generators, true).unwrap();

        assert_eq!(orbits, vec![vec![1, 2, 3], vec![4, 5], vec![0]]);
    }

    #[test]
    fn points_mapped_outside_are_a_defect() {
        let generators = vec![vec![4, 1, 2, 3, 0]];

        assert_eq!(
            point_orbits(3, &generators, false),
            Err(DetectorDefect::OrbitOutOfRange {
                representative: 4,
                len: 3
            })
        );
    }

    #[test]
    fn short_generators_are_a_defect() {
        assert!(matches!(
            point_orbits(3, &[vec![1, 0]], false),
            Err(DetectorDefect::LengthMismatch { .. })
        ));
    }

    #[test]
    fn hints_contain_sizes_and_common_divisors() {
        assert_eq!(block_number_hints([6, 4, 4, 1]), vec![2, 4, 6]);
        assert_eq!(block_number_hints([3, 5]), vec![3, 5]);
    }
}
