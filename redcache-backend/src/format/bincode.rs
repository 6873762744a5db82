use bytes::Bytes;
use redcache_core::Raw;

use super::{Format, FormatDeserializer, FormatError, FormatSerializer, FormatTypeId};

// bincode keeps its own VecWriter private, so the encoder writes into this.
#[derive(Default)]
pub struct BincodeVecWriter(Vec<u8>);

impl BincodeVecWriter {
    pub fn into_vec(self) -> Vec<u8> {
        self.0
    }
}

impl ::bincode::enc::write::Writer for BincodeVecWriter {
    fn write(&mut self, bytes: &[u8]) -> Result<(), ::bincode::error::EncodeError> {
        self.0.extend_from_slice(bytes);
        Ok(())
    }
}

/// Bincode format.
///
/// Smaller payloads than JSON, but counters written through it cannot be
/// changed with `INCRBY`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BincodeFormat;

impl Format for BincodeFormat {
    fn with_serializer(
        &self,
        f: &mut dyn FnMut(&mut FormatSerializer) -> Result<(), FormatError>,
    ) -> Result<Raw, FormatError> {
        let config = ::bincode::config::standard();
        let mut encoder = ::bincode::enc::EncoderImpl::new(BincodeVecWriter::default(), config);

        let mut format_ser = FormatSerializer::Bincode(&mut encoder);
        f(&mut format_ser)?;

        Ok(Bytes::from(encoder.into_writer().into_vec()))
    }

    fn with_deserializer(
        &self,
        data: &[u8],
        f: &mut dyn FnMut(&mut FormatDeserializer) -> Result<(), FormatError>,
    ) -> Result<(), FormatError> {
        let reader = ::bincode::de::read::SliceReader::new(data);
        let config = ::bincode::config::standard();
        let mut decoder = ::bincode::de::DecoderImpl::new(reader, config, ());

        let mut format_deser = FormatDeserializer::Bincode(&mut decoder);
        f(&mut format_deser)
    }

    fn clone_box(&self) -> Box<dyn Format> {
        Box::new(*self)
    }

    fn format_type_id(&self) -> FormatTypeId {
        FormatTypeId::Bincode
    }
}
