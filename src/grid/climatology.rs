//! Temporal aggregation of gridded time series into a monthly climatology.

use crate::grid::error::GridError;
use crate::types::month::CalendarMonth;
use chrono::NaiveDateTime;
use ordered_float::OrderedFloat;
use std::cmp::Ordering;

/// One time step of a gridded variable, cells in grid order.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeStep {
    pub time: NaiveDateTime,
    pub values: Vec<f64>,
}

impl TimeStep {
    pub fn new(time: NaiveDateTime, values: Vec<f64>) -> Self {
        Self { time, values }
    }

    pub fn month(&self) -> CalendarMonth {
        CalendarMonth::of(&self.time)
    }
}

/// Groups `steps` by calendar month and averages each cell within the group.
///
/// Returns twelve layers (January first) of `cells` values each. NaN cells are
/// skipped when averaging; a cell with no finite value in a month, or a month
/// with no time steps at all, is NaN.
///
/// The result does not depend on the order of `steps`: every group is summed in
/// a canonical order (by time, then by cell values).
pub fn monthly_climatology(
    mut steps: Vec<TimeStep>,
    cells: usize,
) -> Result<Vec<Vec<f64>>, GridError> {
    if let Some(bad) = steps.iter().find(|s| s.values.len() != cells) {
        return Err(GridError::ShapeMismatch {
            expected: cells,
            found: bad.values.len(),
        });
    }
    steps.sort_by(canonical_order);
    Ok(average_by_month(
        steps.iter().map(|s| (s.month(), s.values.as_slice())),
        cells,
    ))
}

/// Averages layers that are already labelled with a calendar month, e.g. a
/// dataset with an explicit month axis. Repeated months are averaged.
pub fn month_axis_layers(
    months: &[i64],
    layers: Vec<Vec<f64>>,
    cells: usize,
) -> Result<Vec<Vec<f64>>, GridError> {
    if months.len() != layers.len() {
        return Err(GridError::LayerCount {
            expected: months.len(),
            found: layers.len(),
        });
    }
    let mut labelled = Vec::with_capacity(layers.len());
    for (&month, layer) in months.iter().zip(layers) {
        let calendar_month = u32::try_from(month)
            .ok()
            .and_then(CalendarMonth::new)
            .ok_or(GridError::InvalidMonth(month))?;
        if layer.len() != cells {
            return Err(GridError::ShapeMismatch {
                expected: cells,
                found: layer.len(),
            });
        }
        labelled.push((calendar_month, layer));
    }
    labelled.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| compare_values(&a.1, &b.1)));
    Ok(average_by_month(
        labelled.iter().map(|(m, layer)| (*m, layer.as_slice())),
        cells,
    ))
}

fn average_by_month<'a>(
    groups: impl Iterator<Item = (CalendarMonth, &'a [f64])>,
    cells: usize,
) -> Vec<Vec<f64>> {
    let mut sums = vec![vec![0.0f64; cells]; CalendarMonth::COUNT];
    let mut counts = vec![vec![0u32; cells]; CalendarMonth::COUNT];

    for (month, values) in groups {
        let sum = &mut sums[month.index()];
        let count = &mut counts[month.index()];
        for (cell, value) in values.iter().enumerate() {
            if value.is_finite() {
                sum[cell] += value;
                count[cell] += 1;
            }
        }
    }

    sums.into_iter()
        .zip(counts)
        .map(|(sum, count)| {
            sum.into_iter()
                .zip(count)
                .map(|(s, n)| if n == 0 { f64::NAN } else { s / n as f64 })
                .collect()
        })
        .collect()
}

fn canonical_order(a: &TimeStep, b: &TimeStep) -> Ordering {
    a.time
        .cmp(&b.time)
        .then_with(|| compare_values(&a.values, &b.values))
}

fn compare_values(a: &[f64], b: &[f64]) -> Ordering {
    a.iter()
        .map(|v| OrderedFloat(*v))
        .cmp(b.iter().map(|v| OrderedFloat(*v)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(year: i32, month: u32, day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(year, month, day)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn month_layer(layers: &[Vec<f64>], month: u32) -> &[f64] {
        &layers[(month - 1) as usize]
    }

    #[test]
    fn averages_each_calendar_month_across_years() {
        let steps = vec![
            TimeStep::new(at(2000, 1, 1), vec![1.0, 10.0]),
            TimeStep::new(at(2001, 1, 1), vec![3.0, 20.0]),
            TimeStep::new(at(2000, 7, 1), vec![5.0, 5.0]),
        ];
        let layers = monthly_climatology(steps, 2).unwrap();
        assert_eq!(layers.len(), 12);
        assert_eq!(month_layer(&layers, 1), &[2.0, 15.0]);
        assert_eq!(month_layer(&layers, 7), &[5.0, 5.0]);
        assert!(month_layer(&layers, 2).iter().all(|v| v.is_nan()));
    }

    #[test]
    fn nan_cells_are_skipped_not_propagated() {
        let steps = vec![
            TimeStep::new(at(2000, 3, 1), vec![f64::NAN, 1.0]),
            TimeStep::new(at(2001, 3, 1), vec![4.0, f64::NAN]),
            TimeStep::new(at(2002, 3, 1), vec![f64::NAN, f64::NAN]),
        ];
        let layers = monthly_climatology(steps, 2).unwrap();
        assert_eq!(month_layer(&layers, 3), &[4.0, 1.0]);
    }

    #[test]
    fn permuting_time_steps_gives_identical_means() {
        let values = [0.1, 0.7, 1e16, -1e16, 3.3, 0.2, 1e-3, 42.0];
        let steps: Vec<TimeStep> = values
            .iter()
            .enumerate()
            .map(|(i, v)| TimeStep::new(at(1991 + i as i32, 5, 1), vec![*v, v * 2.0]))
            .collect();

        let forward = monthly_climatology(steps.clone(), 2).unwrap();
        let mut reversed_steps = steps.clone();
        reversed_steps.reverse();
        let reversed = monthly_climatology(reversed_steps, 2).unwrap();
        let mut rotated_steps = steps;
        rotated_steps.rotate_left(3);
        let rotated = monthly_climatology(rotated_steps, 2).unwrap();

        let bits = |layers: &Vec<Vec<f64>>| -> Vec<u64> {
            layers.iter().flatten().map(|v| v.to_bits()).collect()
        };
        assert_eq!(bits(&forward), bits(&reversed));
        assert_eq!(bits(&forward), bits(&rotated));
    }

    #[test]
    fn shape_mismatch_is_rejected() {
        let steps = vec![TimeStep::new(at(2000, 1, 1), vec![1.0])];
        assert_eq!(
            monthly_climatology(steps, 2),
            Err(GridError::ShapeMismatch {
                expected: 2,
                found: 1
            })
        );
    }

    #[test]
    fn month_axis_layers_are_placed_by_label() {
        let layers = month_axis_layers(&[12, 1], vec![vec![-1.0], vec![1.0]], 1).unwrap();
        assert_eq!(month_layer(&layers, 1), &[1.0]);
        assert_eq!(month_layer(&layers, 12), &[-1.0]);
        assert!(month_layer(&layers, 6)[0].is_nan());

        assert_eq!(
            month_axis_layers(&[13], vec![vec![0.0]], 1),
            Err(GridError::InvalidMonth(13))
        );
    }
}
