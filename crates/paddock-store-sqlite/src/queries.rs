//! Read-only aggregate queries over a loaded warehouse.
//!
//! These are the questions the dashboard asks. Nothing here writes, and
//! nothing here knows how the tables were loaded.

use rusqlite::Row;
use serde::Serialize;

use crate::{Result, SqliteWarehouse};

// ─── Result types ────────────────────────────────────────────────────────────

/// A driver and how many times something happened to them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DriverTally {
  pub driver_id:   i64,
  pub full_name:   Option<String>,
  pub nationality: Option<String>,
  pub count:       u64,
}

/// The driver with the most wins in a decade.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecadeLeader {
  pub decade:    i32,
  pub driver_id: i64,
  pub full_name: Option<String>,
  pub wins:      u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConstructorPerformance {
  pub constructor_id: i64,
  pub name:           Option<String>,
  pub starts:         u64,
  pub wins:           u64,
  pub podiums:        u64,
  pub points:         f64,
}

/// How often the pole sitter went on to win.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PoleConversion {
  pub poles:     u64,
  pub converted: u64,
  /// `converted / poles`, or `0.0` with no poles.
  pub rate:      f64,
}

/// A driver's season total.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Standing {
  pub driver_id: i64,
  pub full_name: Option<String>,
  pub points:    f64,
  pub wins:      u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeasonRaces {
  pub year:  i32,
  pub races: u64,
}

fn get_u64(row: &Row<'_>, idx: usize) -> rusqlite::Result<u64> {
  row.get::<_, i64>(idx).map(|n| n.max(0) as u64)
}

fn driver_tally(row: &Row<'_>) -> rusqlite::Result<DriverTally> {
  Ok(DriverTally {
    driver_id:   row.get(0)?,
    full_name:   row.get(1)?,
    nationality: row.get(2)?,
    count:       get_u64(row, 3)?,
  })
}

// ─── Queries ─────────────────────────────────────────────────────────────────

impl SqliteWarehouse {
  /// Drivers ranked by race wins.
  pub async fn top_drivers_by_wins(&self, limit: usize) -> Result<Vec<DriverTally>> {
    self.driver_ranking("is_win", limit).await
  }

  /// Drivers ranked by pole positions.
  pub async fn top_drivers_by_poles(&self, limit: usize) -> Result<Vec<DriverTally>> {
    self.driver_ranking("is_pole", limit).await
  }

  async fn driver_ranking(&self, flag: &'static str, limit: usize) -> Result<Vec<DriverTally>> {
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    let sql = format!(
      "SELECT p.driver_id, p.full_name, p.nationality, SUM(f.{flag}) AS n
       FROM fact_race_result f
       JOIN dim_driver p ON p.driver_id = f.driver_id
       GROUP BY p.driver_id, p.full_name, p.nationality
       HAVING n > 0
       ORDER BY n DESC, p.driver_id
       LIMIT ?1"
    );

    let rows = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map([limit], driver_tally)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(rows)
  }

  /// The winningest driver of every decade; ties go to the lower driver id.
  pub async fn decade_leaders(&self) -> Result<Vec<DecadeLeader>> {
    let rows = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "WITH wins AS (
             SELECT t.decade, p.driver_id, p.full_name, SUM(f.is_win) AS wins
             FROM fact_race_result f
             JOIN dim_time   t ON t.time_key  = f.time_key
             JOIN dim_driver p ON p.driver_id = f.driver_id
             GROUP BY t.decade, p.driver_id, p.full_name
             HAVING wins > 0
           ),
           ranked AS (
             SELECT *, ROW_NUMBER() OVER (
               PARTITION BY decade ORDER BY wins DESC, driver_id
             ) AS rn
             FROM wins
           )
           SELECT decade, driver_id, full_name, wins
           FROM ranked
           WHERE rn = 1
           ORDER BY decade",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(DecadeLeader {
              decade:    row.get(0)?,
              driver_id: row.get(1)?,
              full_name: row.get(2)?,
              wins:      get_u64(row, 3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(rows)
  }

  /// Constructors ranked by wins, then points.
  pub async fn constructor_performance(
    &self,
    limit: usize,
  ) -> Result<Vec<ConstructorPerformance>> {
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    let rows = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT c.constructor_id, c.name, COUNT(*), SUM(f.is_win),
                  SUM(f.is_podium), TOTAL(f.points)
           FROM fact_race_result f
           JOIN dim_constructor c ON c.constructor_id = f.constructor_id
           GROUP BY c.constructor_id, c.name
           ORDER BY SUM(f.is_win) DESC, TOTAL(f.points) DESC, c.constructor_id
           LIMIT ?1",
        )?;
        let rows = stmt
          .query_map([limit], |row| {
            Ok(ConstructorPerformance {
              constructor_id: row.get(0)?,
              name:           row.get(1)?,
              starts:         get_u64(row, 2)?,
              wins:           get_u64(row, 3)?,
              podiums:        get_u64(row, 4)?,
              points:         row.get(5)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(rows)
  }

  pub async fn pole_conversion(&self) -> Result<PoleConversion> {
    let (poles, converted) = self
      .conn
      .call(|conn| {
        Ok(conn.query_row(
          "SELECT COALESCE(SUM(is_pole), 0),
                  COALESCE(SUM(is_pole AND is_win), 0)
           FROM fact_race_result",
          [],
          |row| Ok((get_u64(row, 0)?, get_u64(row, 1)?)),
        )?)
      })
      .await?;

    let rate = if poles == 0 { 0.0 } else { converted as f64 / poles as f64 };
    Ok(PoleConversion { poles, converted, rate })
  }

  /// Driver points table for one season, highest first.
  pub async fn season_standings(&self, year: i32) -> Result<Vec<Standing>> {
    let rows = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT p.driver_id, p.full_name, TOTAL(f.points) AS pts, SUM(f.is_win)
           FROM fact_race_result f
           JOIN dim_time   t ON t.time_key  = f.time_key
           JOIN dim_driver p ON p.driver_id = f.driver_id
           WHERE t.year = ?1
           GROUP BY p.driver_id, p.full_name
           ORDER BY pts DESC, SUM(f.is_win) DESC, p.driver_id",
        )?;
        let rows = stmt
          .query_map([year], |row| {
            Ok(Standing {
              driver_id: row.get(0)?,
              full_name: row.get(1)?,
              points:    row.get(2)?,
              wins:      get_u64(row, 3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(rows)
  }

  /// Number of distinct races with at least one loaded result, per year.
  pub async fn races_per_year(&self) -> Result<Vec<SeasonRaces>> {
    let rows = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT t.year, COUNT(DISTINCT f.race_id)
           FROM fact_race_result f
           JOIN dim_time t ON t.time_key = f.time_key
           GROUP BY t.year
           ORDER BY t.year",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(SeasonRaces { year: row.get(0)?, races: get_u64(row, 1)? })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(rows)
  }
}
