//! SQL schema for the paddock warehouse.
//!
//! Executed by `init_schema`; idempotent thanks to `CREATE TABLE IF NOT
//! EXISTS`, so re-running the pipeline never drops loaded data.

/// Full schema DDL.
///
/// No `REFERENCES` clauses: referential integrity between facts and
/// dimensions is audited after the load, not enforced here.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS dim_driver (
    driver_id     INTEGER PRIMARY KEY,
    forename      TEXT,
    surname       TEXT,
    full_name     TEXT,
    code          TEXT,
    number        INTEGER,
    nationality   TEXT,
    date_of_birth TEXT,            -- YYYY-MM-DD
    url           TEXT
);

CREATE TABLE IF NOT EXISTS dim_constructor (
    constructor_id INTEGER PRIMARY KEY,
    name           TEXT,
    reference      TEXT,
    nationality    TEXT,
    url            TEXT
);

CREATE TABLE IF NOT EXISTS dim_circuit (
    circuit_id INTEGER PRIMARY KEY,
    name       TEXT,
    location   TEXT,
    country    TEXT,
    latitude   REAL,
    longitude  REAL,
    altitude   REAL,
    url        TEXT
);

-- Synthesised from race dates; time_key is YYYYMMDD.
CREATE TABLE IF NOT EXISTS dim_time (
    time_key     INTEGER PRIMARY KEY,
    date         TEXT    NOT NULL,
    year         INTEGER NOT NULL,
    month        INTEGER NOT NULL CHECK (month BETWEEN 1 AND 12),
    day          INTEGER NOT NULL CHECK (day BETWEEN 1 AND 31),
    quarter      INTEGER NOT NULL CHECK (quarter BETWEEN 1 AND 4),
    decade       INTEGER NOT NULL,
    month_name   TEXT    NOT NULL,
    weekday_name TEXT    NOT NULL,
    is_weekend   INTEGER NOT NULL CHECK (is_weekend IN (0, 1))
);

CREATE TABLE IF NOT EXISTS dim_race (
    race_id    INTEGER PRIMARY KEY,
    year       INTEGER,
    round      INTEGER,
    circuit_id INTEGER NOT NULL,
    name       TEXT,
    date       TEXT,               -- YYYY-MM-DD
    time       TEXT,               -- HH:MM:SS
    url        TEXT
);

-- One row per driver per race, keyed by the source result id.
CREATE TABLE IF NOT EXISTS fact_race_result (
    result_id         INTEGER PRIMARY KEY,
    race_id           INTEGER NOT NULL,
    driver_id         INTEGER NOT NULL,
    constructor_id    INTEGER NOT NULL,
    circuit_id        INTEGER NOT NULL,
    time_key          INTEGER NOT NULL,
    points            REAL    CHECK (points IS NULL OR points >= 0),
    final_position    INTEGER CHECK (final_position IS NULL OR final_position >= 1),
    starting_position INTEGER CHECK (starting_position IS NULL OR starting_position >= 0),
    laps              INTEGER CHECK (laps IS NULL OR laps >= 0),
    elapsed_ms        INTEGER CHECK (elapsed_ms IS NULL OR elapsed_ms >= 0),
    fastest_lap       INTEGER,
    fastest_lap_time  TEXT,
    average_speed     REAL,
    status_id         INTEGER,
    is_win            INTEGER NOT NULL CHECK (is_win IN (0, 1)),
    is_podium         INTEGER NOT NULL CHECK (is_podium IN (0, 1)),
    is_pole           INTEGER NOT NULL CHECK (is_pole IN (0, 1)),
    is_scored         INTEGER NOT NULL CHECK (is_scored IN (0, 1)),
    is_finished       INTEGER NOT NULL CHECK (is_finished IN (0, 1))
);

CREATE INDEX IF NOT EXISTS fact_race_idx        ON fact_race_result(race_id);
CREATE INDEX IF NOT EXISTS fact_driver_idx      ON fact_race_result(driver_id);
CREATE INDEX IF NOT EXISTS fact_constructor_idx ON fact_race_result(constructor_id);
CREATE INDEX IF NOT EXISTS fact_circuit_idx     ON fact_race_result(circuit_id);
CREATE INDEX IF NOT EXISTS fact_time_idx        ON fact_race_result(time_key);

PRAGMA user_version = 1;
";
