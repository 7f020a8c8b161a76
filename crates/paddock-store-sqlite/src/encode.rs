//! Binding Rust domain rows to their SQLite columns.
//!
//! Dates are stored as `YYYY-MM-DD` text, times as `HH:MM:SS`, booleans as
//! `0`/`1`. Every statement binds by parameter name, so a column reorder in
//! the schema cannot shift a value into the wrong column.

use chrono::{NaiveDate, NaiveTime};
use paddock_core::{
  calendar::TimeRow,
  dimension::{Circuit, Constructor, Driver, Race},
  fact::ResultFact,
};
use rusqlite::{Statement, named_params};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn encode_time(t: NaiveTime) -> String { t.format("%H:%M:%S").to_string() }

// ─── Rows ────────────────────────────────────────────────────────────────────

/// A row type with a duplicate-suppressing insert statement.
pub trait Insertable {
  /// `INSERT … ON CONFLICT (<key>) DO NOTHING`; other constraint failures
  /// still surface as errors.
  const INSERT: &'static str;

  /// Natural key, for logs and failure reports.
  fn key(&self) -> String;

  /// Execute the prepared [`Self::INSERT`]; returns the number of rows
  /// written (0 for a duplicate).
  fn insert(&self, stmt: &mut Statement<'_>) -> rusqlite::Result<usize>;
}

impl Insertable for Driver {
  const INSERT: &'static str = "
    INSERT INTO dim_driver (
      driver_id, forename, surname, full_name, code,
      number, nationality, date_of_birth, url
    ) VALUES (
      :driver_id, :forename, :surname, :full_name, :code,
      :number, :nationality, :date_of_birth, :url
    )
    ON CONFLICT (driver_id) DO NOTHING";

  fn key(&self) -> String { self.driver_id.to_string() }

  fn insert(&self, stmt: &mut Statement<'_>) -> rusqlite::Result<usize> {
    stmt.execute(named_params! {
      ":driver_id":     self.driver_id,
      ":forename":      self.forename,
      ":surname":       self.surname,
      ":full_name":     self.full_name,
      ":code":          self.code,
      ":number":        self.number,
      ":nationality":   self.nationality,
      ":date_of_birth": self.date_of_birth.map(encode_date),
      ":url":           self.url,
    })
  }
}

impl Insertable for Constructor {
  const INSERT: &'static str = "
    INSERT INTO dim_constructor (constructor_id, name, reference, nationality, url)
    VALUES (:constructor_id, :name, :reference, :nationality, :url)
    ON CONFLICT (constructor_id) DO NOTHING";

  fn key(&self) -> String { self.constructor_id.to_string() }

  fn insert(&self, stmt: &mut Statement<'_>) -> rusqlite::Result<usize> {
    stmt.execute(named_params! {
      ":constructor_id": self.constructor_id,
      ":name":           self.name,
      ":reference":      self.reference,
      ":nationality":    self.nationality,
      ":url":            self.url,
    })
  }
}

impl Insertable for Circuit {
  const INSERT: &'static str = "
    INSERT INTO dim_circuit (
      circuit_id, name, location, country, latitude, longitude, altitude, url
    ) VALUES (
      :circuit_id, :name, :location, :country, :latitude, :longitude, :altitude, :url
    )
    ON CONFLICT (circuit_id) DO NOTHING";

  fn key(&self) -> String { self.circuit_id.to_string() }

  fn insert(&self, stmt: &mut Statement<'_>) -> rusqlite::Result<usize> {
    stmt.execute(named_params! {
      ":circuit_id": self.circuit_id,
      ":name":       self.name,
      ":location":   self.location,
      ":country":    self.country,
      ":latitude":   self.latitude,
      ":longitude":  self.longitude,
      ":altitude":   self.altitude,
      ":url":        self.url,
    })
  }
}

impl Insertable for TimeRow {
  const INSERT: &'static str = "
    INSERT INTO dim_time (
      time_key, date, year, month, day, quarter,
      decade, month_name, weekday_name, is_weekend
    ) VALUES (
      :time_key, :date, :year, :month, :day, :quarter,
      :decade, :month_name, :weekday_name, :is_weekend
    )
    ON CONFLICT (time_key) DO NOTHING";

  fn key(&self) -> String { self.time_key.to_string() }

  fn insert(&self, stmt: &mut Statement<'_>) -> rusqlite::Result<usize> {
    stmt.execute(named_params! {
      ":time_key":     self.time_key.get(),
      ":date":         encode_date(self.date),
      ":year":         self.year,
      ":month":        self.month,
      ":day":          self.day,
      ":quarter":      self.quarter,
      ":decade":       self.decade,
      ":month_name":   self.month_name,
      ":weekday_name": self.weekday_name,
      ":is_weekend":   self.is_weekend,
    })
  }
}

impl Insertable for Race {
  const INSERT: &'static str = "
    INSERT INTO dim_race (race_id, year, round, circuit_id, name, date, time, url)
    VALUES (:race_id, :year, :round, :circuit_id, :name, :date, :time, :url)
    ON CONFLICT (race_id) DO NOTHING";

  fn key(&self) -> String { self.race_id.to_string() }

  fn insert(&self, stmt: &mut Statement<'_>) -> rusqlite::Result<usize> {
    stmt.execute(named_params! {
      ":race_id":    self.race_id,
      ":year":       self.year,
      ":round":      self.round,
      ":circuit_id": self.circuit_id,
      ":name":       self.name,
      ":date":       self.date.map(encode_date),
      ":time":       self.time.map(encode_time),
      ":url":        self.url,
    })
  }
}

impl Insertable for ResultFact {
  const INSERT: &'static str = "
    INSERT INTO fact_race_result (
      result_id, race_id, driver_id, constructor_id, circuit_id, time_key,
      points, final_position, starting_position, laps, elapsed_ms,
      fastest_lap, fastest_lap_time, average_speed, status_id,
      is_win, is_podium, is_pole, is_scored, is_finished
    ) VALUES (
      :result_id, :race_id, :driver_id, :constructor_id, :circuit_id, :time_key,
      :points, :final_position, :starting_position, :laps, :elapsed_ms,
      :fastest_lap, :fastest_lap_time, :average_speed, :status_id,
      :is_win, :is_podium, :is_pole, :is_scored, :is_finished
    )
    ON CONFLICT (result_id) DO NOTHING";

  fn key(&self) -> String { self.result_id.to_string() }

  fn insert(&self, stmt: &mut Statement<'_>) -> rusqlite::Result<usize> {
    let m = &self.measures;
    let d = &self.derived;
    stmt.execute(named_params! {
      ":result_id":         self.result_id,
      ":race_id":           self.race_id,
      ":driver_id":         self.driver_id,
      ":constructor_id":    self.constructor_id,
      ":circuit_id":        self.circuit_id,
      ":time_key":          self.time_key.get(),
      ":points":            m.points,
      ":final_position":    m.final_position,
      ":starting_position": m.starting_position,
      ":laps":              m.laps,
      ":elapsed_ms":        m.elapsed_ms,
      ":fastest_lap":       m.fastest_lap,
      ":fastest_lap_time":  m.fastest_lap_time,
      ":average_speed":     m.average_speed,
      ":status_id":         m.status_id,
      ":is_win":            d.is_win,
      ":is_podium":         d.is_podium,
      ":is_pole":           d.is_pole,
      ":is_scored":         d.is_scored,
      ":is_finished":       d.is_finished,
    })
  }
}
