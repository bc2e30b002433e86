//! Region Aggregator Module
//! Groups source rows by (state, district) and merges sources with an explicit outer union.

use super::loader::{SourceTable, SourceTables, DISTRICT_COL, ENROLMENT_COLUMNS, STATE_COL};
use super::region::{EnrolmentBrackets, RegionAggregate, RegionKey};
use polars::prelude::*;
use std::collections::{BTreeMap, BTreeSet};

const TOTAL_COL: &str = "total";

/// Grouped summation over source tables.
pub struct Aggregator;

impl Aggregator {
    /// Sum every count column of a source per region.
    ///
    /// Empty sources, and sources without count columns, yield no regions.
    pub fn region_totals(table: &SourceTable) -> PolarsResult<BTreeMap<RegionKey, f64>> {
        let Some(df) = &table.frame else {
            return Ok(BTreeMap::new());
        };

        let total = table
            .count_columns
            .iter()
            .map(|c| col(c.as_str()).fill_null(lit(0.0)))
            .reduce(|acc, e| acc + e);
        let Some(total) = total else {
            return Ok(BTreeMap::new());
        };

        let grouped = Self::group_by_region(df, vec![total.sum().alias(TOTAL_COL)])?;
        let keys = Self::region_keys(&grouped)?;
        let totals = Self::float_values(&grouped, TOTAL_COL)?;

        Ok(keys.into_iter().zip(totals).collect())
    }

    /// Per-region enrolment sums for each age bracket.
    pub fn enrolment_brackets(
        table: &SourceTable,
    ) -> PolarsResult<BTreeMap<RegionKey, EnrolmentBrackets>> {
        let Some(df) = &table.frame else {
            return Ok(BTreeMap::new());
        };

        let aggs = ENROLMENT_COLUMNS
            .iter()
            .map(|c| col(*c).fill_null(lit(0.0)).sum().alias(*c))
            .collect();
        let grouped = Self::group_by_region(df, aggs)?;

        let keys = Self::region_keys(&grouped)?;
        let young = Self::float_values(&grouped, ENROLMENT_COLUMNS[0])?;
        let school = Self::float_values(&grouped, ENROLMENT_COLUMNS[1])?;
        let adult = Self::float_values(&grouped, ENROLMENT_COLUMNS[2])?;

        Ok(keys
            .into_iter()
            .zip(young.into_iter().zip(school).zip(adult))
            .map(|(key, ((age_0_5, age_5_17), age_18_greater))| {
                (
                    key,
                    EnrolmentBrackets {
                        age_0_5,
                        age_5_17,
                        age_18_greater,
                    },
                )
            })
            .collect())
    }

    /// Demographic plus biometric totals. A region absent from one source
    /// contributes zero from that source.
    pub fn update_totals(
        demographic: &SourceTable,
        biometric: &SourceTable,
    ) -> PolarsResult<BTreeMap<RegionKey, f64>> {
        let mut totals = Self::region_totals(demographic)?;
        for (key, value) in Self::region_totals(biometric)? {
            *totals.entry(key).or_insert(0.0) += value;
        }
        Ok(totals)
    }

    /// Outer union of enrolment and update regions.
    ///
    /// Every key present on either side appears once; the missing side is
    /// zero and the coverage flags record which sides had rows.
    pub fn outer_union(
        enrolment: &BTreeMap<RegionKey, EnrolmentBrackets>,
        updates: &BTreeMap<RegionKey, f64>,
    ) -> Vec<RegionAggregate> {
        let keys: BTreeSet<&RegionKey> = enrolment.keys().chain(updates.keys()).collect();

        keys.into_iter()
            .map(|key| {
                let brackets = enrolment.get(key).copied();
                let update_total = updates.get(key).copied();
                let brackets_or_zero = brackets.unwrap_or_default();
                RegionAggregate {
                    key: key.clone(),
                    enrolments: brackets_or_zero.total(),
                    updates: update_total.unwrap_or(0.0),
                    brackets: brackets_or_zero,
                    has_enrolment_rows: brackets.is_some(),
                    has_update_rows: update_total.is_some(),
                }
            })
            .collect()
    }

    /// Aggregate all sources into one row per region, ordered by key.
    pub fn aggregate(tables: &SourceTables) -> PolarsResult<Vec<RegionAggregate>> {
        let enrolment = Self::enrolment_brackets(&tables.enrolment)?;
        let updates = Self::update_totals(&tables.demographic, &tables.biometric)?;
        Ok(Self::outer_union(&enrolment, &updates))
    }

    fn group_by_region(df: &DataFrame, aggs: Vec<Expr>) -> PolarsResult<DataFrame> {
        df.clone()
            .lazy()
            .filter(col(STATE_COL).is_not_null().and(col(DISTRICT_COL).is_not_null()))
            .group_by([col(STATE_COL), col(DISTRICT_COL)])
            .agg(aggs)
            .collect()
    }

    fn region_keys(df: &DataFrame) -> PolarsResult<Vec<RegionKey>> {
        let states = df.column(STATE_COL)?.str()?;
        let districts = df.column(DISTRICT_COL)?.str()?;

        Ok(states
            .into_iter()
            .zip(districts.into_iter())
            .map(|(s, d)| RegionKey::new(s.unwrap_or_default(), d.unwrap_or_default()))
            .collect())
    }

    fn float_values(df: &DataFrame, name: &str) -> PolarsResult<Vec<f64>> {
        let values = df.column(name)?.cast(&DataType::Float64)?;
        Ok(values.f64()?.into_iter().map(|v| v.unwrap_or(0.0)).collect())
    }
}
