use alloc::vec::Vec;

use serde::ser::SerializeStruct;
use serde::Deserialize;

use crate::{storage::TensorStorage, Tensor4};

impl<S: TensorStorage> serde::Serialize for Tensor4<S> {
    fn serialize<Ser>(&self, serializer: Ser) -> Result<Ser::Ok, Ser::Error>
    where
        Ser: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("Tensor4", 2)?;
        state.serialize_field("data", self.as_slice())?;
        state.serialize_field("shape", &self.shape())?;
        state.end()
    }
}

impl<'de> serde::Deserialize<'de> for Tensor4<Vec<f32>> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct TensorData {
            data: Vec<f32>,
            shape: [u8; 4],
        }

        let TensorData { data, shape } = TensorData::deserialize(deserializer)?;

        Tensor4::from_shape_vec(shape, data).map_err(serde::de::Error::custom)
    }
}
