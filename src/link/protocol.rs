use serde::{Deserialize, Serialize};

/// One decoded reading from the meter. Fields are exactly the six numeric
/// values the device reports per line; the `energy` counter is cumulative
/// and owned by the device, not derived here.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TelemetryReading {
    /// Volts
    pub voltage: f64,
    /// Amperes
    pub current: f64,
    /// Watts
    pub power: f64,
    /// kWh, cumulative per device session
    pub energy: f64,
    /// Hertz
    pub frequency: f64,
    /// Power factor, dimensionless
    pub pf: f64,
}

/// One line of the wire protocol. The device writes newline-delimited JSON
/// objects with a `status` discriminator: `"success"` carries the six
/// numeric fields, anything else carries an error `message`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TelemetryEnvelope {
    Reading {
        status: String,
        voltage: f64,
        current: f64,
        power: f64,
        energy: f64,
        frequency: f64,
        pf: f64,
    },
    SensorError {
        status: String,
        message: String,
    },
}

/// Decode one wire line. `Ok(Some(..))` is a success reading,
/// `Ok(None)` a device-reported sensor error (already a valid envelope),
/// `Err` an unparseable line. Both non-reading cases are the caller's to
/// log; neither stops the stream.
pub fn decode_line(line: &str) -> Result<Option<TelemetryReading>, serde_json::Error> {
    let envelope: TelemetryEnvelope = serde_json::from_str(line)?;
    match envelope {
        TelemetryEnvelope::Reading {
            status,
            voltage,
            current,
            power,
            energy,
            frequency,
            pf,
        } if status == "success" => Ok(Some(TelemetryReading {
            voltage,
            current,
            power,
            energy,
            frequency,
            pf,
        })),
        TelemetryEnvelope::Reading { status, .. } => {
            tracing::warn!(status = %status, "sensor reported non-success status with full payload");
            Ok(None)
        }
        TelemetryEnvelope::SensorError { status, message } => {
            tracing::warn!(status = %status, message = %message, "sensor read error");
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_line_decodes_all_fields() {
        let line = r#"{"status":"success","voltage":230.1,"current":1.2,"power":276,"energy":0.05,"frequency":50,"pf":0.97}"#;
        let reading = decode_line(line).unwrap().unwrap();
        assert_eq!(reading.voltage, 230.1);
        assert_eq!(reading.current, 1.2);
        assert_eq!(reading.power, 276.0);
        assert_eq!(reading.energy, 0.05);
        assert_eq!(reading.frequency, 50.0);
        assert_eq!(reading.pf, 0.97);
    }

    #[test]
    fn test_sensor_error_line_yields_no_reading() {
        let line = r#"{"status":"error","message":"PZEM read timeout"}"#;
        assert!(decode_line(line).unwrap().is_none());
    }

    #[test]
    fn test_malformed_line_is_an_error() {
        assert!(decode_line("not json at all").is_err());
        assert!(decode_line(r#"{"status":"success","voltage":230.1}"#).is_err());
    }

    #[test]
    fn test_reading_serializes_round_trip() {
        let reading = TelemetryReading {
            voltage: 229.8,
            current: 0.4,
            power: 92.0,
            energy: 1.25,
            frequency: 49.9,
            pf: 0.99,
        };
        let json = serde_json::to_string(&reading).unwrap();
        let back: TelemetryReading = serde_json::from_str(&json).unwrap();
        assert_eq!(back, reading);
    }
}
