use std::fmt::{
    Display,
    Formatter,
};

use bytes::{
    Buf,
    BufMut,
};

use crate::{
    DecodeMode,
    Error,
};

pub const COLUMNS: [&str; Measurement::FIELDS] = [
    "PM1",
    "PM2.5",
    "PM4",
    "PM10",
    "0.3÷0.5",
    "0.3÷1",
    "0.3÷2.5",
    "0.3÷4",
    "0.3÷10",
    "typical size",
];

pub const UNITS: [&str; Measurement::FIELDS] = [
    "ug/m^3", "ug/m^3", "ug/m^3", "ug/m^3", "#/cm^3", "#/cm^3", "#/cm^3", "#/cm^3", "#/cm^3", "um",
];

/// One reading of measured values, in the order the sensor sends them.
///
/// Mass concentrations are in µg/m³, number concentrations in #/cm³ and the typical
/// particle size in µm.
#[derive(Debug, Copy, Clone, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct Measurement {
    pub pm1_0: f32,
    pub pm2_5: f32,
    pub pm4_0: f32,
    pub pm10:  f32,

    pub nc0_5: f32,
    pub nc1_0: f32,
    pub nc2_5: f32,
    pub nc4_0: f32,
    pub nc10:  f32,

    pub typical_particle_size: f32,
}

impl Measurement {
    pub const FIELDS: usize = 10;
    pub const MASS_FIELDS: usize = 4;
    pub const SIZE_BYTES: usize = Self::FIELDS * std::mem::size_of::<f32>();

    pub const ZERO: Self = Self::from_array([0.0; Self::FIELDS]);

    #[inline]
    pub const fn from_array(v: [f32; Self::FIELDS]) -> Self {
        Self {
            pm1_0: v[0],
            pm2_5: v[1],
            pm4_0: v[2],
            pm10:  v[3],

            nc0_5: v[4],
            nc1_0: v[5],
            nc2_5: v[6],
            nc4_0: v[7],
            nc10:  v[8],

            typical_particle_size: v[9],
        }
    }

    #[inline]
    pub const fn to_array(&self) -> [f32; Self::FIELDS] {
        [
            self.pm1_0,
            self.pm2_5,
            self.pm4_0,
            self.pm10,
            self.nc0_5,
            self.nc1_0,
            self.nc2_5,
            self.nc4_0,
            self.nc10,
            self.typical_particle_size,
        ]
    }

    /// Decode ten big-endian IEEE-754 floats. The payload must be exactly
    /// [`Self::SIZE_BYTES`] long.
    pub fn decode(payload: &[u8]) -> Result<Self, Error> {
        if payload.len() != Self::SIZE_BYTES {
            return Err(Error::PayloadLength {
                mode:     DecodeMode::Measurement,
                expected: Self::SIZE_BYTES,
                actual:   payload.len(),
            });
        }

        let mut buf = payload;
        let mut values = [0.0; Self::FIELDS];

        for v in values.iter_mut() {
            *v = buf.get_f32();
        }

        Ok(Self::from_array(values))
    }

    /// As [`Self::decode`], but a payload of the wrong size yields [`Self::ZERO`] so a
    /// continuous monitor keeps running.
    pub fn decode_or_zero(payload: &[u8]) -> Self {
        Self::decode(payload).unwrap_or_else(|e| {
            tracing::warn!(error = %e, payload = %hex::encode(payload), "substituting zero measurement");
            Self::ZERO
        })
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::SIZE_BYTES);

        for v in self.to_array() {
            out.put_f32(v);
        }

        out
    }

    /// Combine two readings field by field.
    #[inline]
    pub fn zip_with(&self, other: &Self, f: impl Fn(f32, f32) -> f32) -> Self {
        let (a, b) = (self.to_array(), other.to_array());

        Self::from_array(std::array::from_fn(|i| f(a[i], b[i])))
    }
}

impl From<[f32; Measurement::FIELDS]> for Measurement {
    #[inline]
    fn from(v: [f32; Measurement::FIELDS]) -> Self {
        Self::from_array(v)
    }
}

/// Comma separated, two decimals per field.
impl Display for Measurement {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for (i, v) in self.to_array().iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }

            write!(f, "{v:.2}")?;
        }

        Ok(())
    }
}
