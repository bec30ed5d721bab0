//! Builders for NetFlow v9 fixtures, everything is big endian.

/// A message header with version 9.
pub fn message_header(count: u16, sequence: u32) -> Vec<u8> {
    let mut buf = Vec::with_capacity(20);
    buf.extend_from_slice(&9u16.to_be_bytes());
    buf.extend_from_slice(&count.to_be_bytes());
    buf.extend_from_slice(&1000u32.to_be_bytes());
    buf.extend_from_slice(&1_700_000_000u32.to_be_bytes());
    buf.extend_from_slice(&sequence.to_be_bytes());
    buf.extend_from_slice(&7u32.to_be_bytes());
    buf
}

/// Field specifiers, `(type, length)` pairs.
pub fn field_specs(fields: &[(u16, u16)]) -> Vec<u8> {
    fields
        .iter()
        .flat_map(|(typ, length)| [typ.to_be_bytes(), length.to_be_bytes()])
        .flatten()
        .collect()
}

/// A template set holding one template record.
pub fn template_set(id: u16, fields: &[(u16, u16)]) -> Vec<u8> {
    let mut body = Vec::with_capacity(4 + 4 * fields.len());
    body.extend_from_slice(&id.to_be_bytes());
    body.extend_from_slice(&(fields.len() as u16).to_be_bytes());
    body.extend(field_specs(fields));

    set(0, &body)
}

/// An options template set holding one record, scope and option fields are
/// given as `(type, length)` pairs.
pub fn options_template_set(id: u16, scopes: &[(u16, u16)], options: &[(u16, u16)]) -> Vec<u8> {
    let mut body = Vec::with_capacity(6 + 4 * (scopes.len() + options.len()));
    body.extend_from_slice(&id.to_be_bytes());
    body.extend_from_slice(&(4 * scopes.len() as u16).to_be_bytes());
    body.extend_from_slice(&(4 * options.len() as u16).to_be_bytes());
    body.extend(field_specs(scopes));
    body.extend(field_specs(options));

    set(1, &body)
}

/// A data flow set built from template `id`.
pub fn data_set(id: u16, body: &[u8]) -> Vec<u8> {
    set(id, body)
}

/// Any set, the length is computed from the body.
pub fn set(id: u16, body: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(4 + body.len());
    buf.extend_from_slice(&id.to_be_bytes());
    buf.extend_from_slice(&((4 + body.len()) as u16).to_be_bytes());
    buf.extend_from_slice(body);
    buf
}
