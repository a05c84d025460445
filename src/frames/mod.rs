pub mod error;
pub mod loader;
pub mod observation_frame;

#[cfg(test)]
pub(crate) mod test_support {
    use super::error::DataError;
    use super::observation_frame::{ObservationFrame, PreparedFrame};

    /// `(city, timestamp, temperature, season)`
    pub(crate) type Row<'a> = (&'a str, String, f64, &'a str);

    pub(crate) fn csv_from_rows(rows: &[Row<'_>]) -> String {
        let mut csv = String::from("city,timestamp,temperature,season\n");
        for (city, timestamp, temperature, season) in rows {
            csv.push_str(&format!("{city},{timestamp},{temperature},{season}\n"));
        }
        csv
    }

    pub(crate) fn prepared_from_rows(rows: &[Row<'_>]) -> Result<PreparedFrame, DataError> {
        ObservationFrame::from_csv_bytes(csv_from_rows(rows).into_bytes())?.prepare()
    }
}
