//! NetFlow v9 field type names.
//!
//! https://tools.ietf.org/html/rfc3954#section-8

/// Rendered in traces when a field type has no registered name.
pub const UNKNOWN: &str = "[UNKNOWN]";

// Holes in the registry are kept as empty strings, so the index is the
// field type id.
static FIELD_TYPES: [&str; 80] = [
    // 0
    "",
    "IN_BYTES",
    "IN_PKTS",
    "FLOWS",
    // 4
    "PROTOCOL",
    "TOS",
    "TCP_FLAGS",
    "L4_SRC_PORT",
    // 8
    "IPV4_SRC_ADDR",
    "SRC_MASK",
    "INPUT_SNMP",
    "L4_DST_PORT",
    // 12
    "IPV4_DST_ADDR",
    "DST_MASK",
    "OUTPUT_SNMP",
    "IPV4_NEXT_HOP",
    // 16
    "SRC_AS",
    "DST_AS",
    "BGP_IPV4_NEXT_HOP",
    "MUL_DST_PKTS",
    // 20
    "MUL_DST_BYTES",
    "LAST_SWITCHED",
    "FIRST_SWITCHED",
    "OUT_BYTES",
    // 24
    "OUT_PKTS",
    "",
    "",
    "IPV6_SRC_ADDR",
    // 28
    "IPV6_DST_ADDR",
    "IPV6_SRC_MASK",
    "IPV6_DST_MASK",
    "IPV6_FLOW_LABEL",
    // 32
    "ICMP_TYPE",
    "MUL_IGMP_TYPE",
    "SAMPLING_INTERVAL",
    "SAMPLING_ALGORITHM",
    // 36
    "FLOW_ACTIVE_TIMEOUT",
    "FLOW_INACTIVE_TIMEOUT",
    "ENGINE_TYPE",
    "ENGINE_ID",
    // 40
    "TOTAL_BYTES_EXP",
    "TOTAL_PKTS_EXP",
    "TOTAL_FLOWS_EXP",
    "",
    // 44
    "",
    "",
    "MPLS_TOP_LABEL_TYPE",
    "MPLS_TOP_LABEL_IP_ADDR",
    // 48
    "FLOW_SAMPLER_ID",
    "FLOW_SAMPLER_MODE",
    "FLOW_SAMPLER_RANDOM_INTERVAL",
    "",
    // 52
    "",
    "",
    "",
    "DST_TOS",
    // 56
    "SRC_MAC",
    "DST_MAC",
    "SRC_VLAN",
    "DST_VLAN",
    // 60
    "IP_PROTOCOL_VERSION",
    "DIRECTION",
    "IPV6_NEXT_HOP",
    "BGP_IPV6_NEXT_HOP",
    // 64
    "IPV6_OPTION_HEADERS",
    "",
    "",
    "",
    // 68
    "",
    "",
    "MPLS_LABEL_1",
    "MPLS_LABEL_2",
    // 72
    "MPLS_LABEL_3",
    "MPLS_LABEL_4",
    "MPLS_LABEL_5",
    "MPLS_LABEL_6",
    // 76
    "MPLS_LABEL_7",
    "MPLS_LABEL_8",
    "MPLS_LABEL_9",
    "MPLS_LABEL_10",
];

/// Returns the registered name of the field type, or `None` if the id is
/// outside the registry or points at a hole in it.
pub fn name_of(id: u16) -> Option<&'static str> {
    FIELD_TYPES
        .get(id as usize)
        .copied()
        .filter(|name| !name.is_empty())
}

/// Like [`name_of`], but renders unknown ids as [`UNKNOWN`].
#[inline]
pub fn display_name(id: u16) -> &'static str {
    name_of(id).unwrap_or(UNKNOWN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known() {
        for (id, want) in [
            (1, "IN_BYTES"),
            (8, "IPV4_SRC_ADDR"),
            (27, "IPV6_SRC_ADDR"),
            (64, "IPV6_OPTION_HEADERS"),
            (79, "MPLS_LABEL_10"),
        ] {
            assert_eq!(name_of(id), Some(want), "id: {id}");
        }
    }

    #[test]
    fn holes_and_out_of_range() {
        for id in [0, 25, 26, 43, 44, 45, 51, 52, 53, 54, 65, 69, 80, 300, u16::MAX] {
            assert_eq!(name_of(id), None, "id: {id}");
            assert_eq!(display_name(id), UNKNOWN);
        }
    }
}
