//! Counter groups and counter types.
//!
//! A group is one polling cadence and counter class; a counter type is one
//! (object, class) pair whose ID list is written as a field of the object's
//! FLEX_COUNTER_TABLE row.

use std::fmt;
use std::str::FromStr;

/// How the poller treats the values of a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatsMode {
    Counter,
    Gauge,
    Status,
}

impl StatsMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Counter => "STATS_MODE_COUNTER",
            Self::Gauge => "STATS_MODE_GAUGE",
            Self::Status => "STATS_MODE_STATUS",
        }
    }
}

/// The three polling groups owned by the flex counter orch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CounterGroup {
    Gauge,
    Counter,
    Status,
}

impl CounterGroup {
    pub const ALL: [CounterGroup; 3] = [CounterGroup::Gauge, CounterGroup::Counter, CounterGroup::Status];

    /// Group row key in FLEX_COUNTER_GROUP_TABLE.
    pub fn group_name(&self) -> &'static str {
        match self {
            Self::Gauge => "1S_STAT_GAUGE",
            Self::Counter => "1S_STAT_COUNTER",
            Self::Status => "1S_STAT_STATUS",
        }
    }

    pub fn stats_mode(&self) -> StatsMode {
        match self {
            Self::Gauge => StatsMode::Gauge,
            Self::Counter => StatsMode::Counter,
            Self::Status => StatsMode::Status,
        }
    }
}

impl fmt::Display for CounterGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.group_name())
    }
}

/// Error type for CounterGroup parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseCounterGroupError {
    pub invalid_key: String,
}

impl fmt::Display for ParseCounterGroupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid flex counter group: {}", self.invalid_key)
    }
}

impl std::error::Error for ParseCounterGroupError {}

impl FromStr for CounterGroup {
    type Err = ParseCounterGroupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1S_STAT_GAUGE" => Ok(Self::Gauge),
            "1S_STAT_COUNTER" => Ok(Self::Counter),
            "1S_STAT_STATUS" => Ok(Self::Status),
            _ => Err(ParseCounterGroupError {
                invalid_key: s.to_string(),
            }),
        }
    }
}

macro_rules! counter_types {
    ($( $variant:ident => ($name:literal, $group:ident, $manifest:expr) ),* $(,)?) => {
        /// One (object, class) pair of counter IDs.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum CounterType {
            $( $variant, )*
        }

        impl CounterType {
            pub const ALL: &'static [CounterType] = &[ $( CounterType::$variant, )* ];

            /// Name of the type, e.g. `PORT_STATUS`.
            pub fn name(&self) -> &'static str {
                match self {
                    $( CounterType::$variant => $name, )*
                }
            }

            /// Group polling this type.
            pub fn group(&self) -> CounterGroup {
                match self {
                    $( CounterType::$variant => CounterGroup::$group, )*
                }
            }

            /// Manifest key listing the IDs of this type, if the manifest carries one.
            pub fn manifest_key(&self) -> Option<&'static str> {
                match self {
                    $( CounterType::$variant => $manifest, )*
                }
            }
        }
    };
}

counter_types! {
    LinecardStatus => ("LINECARD_STATUS", Status, Some("LINECARD_COUNTER_ID_LIST_STATUS")),
    LinecardGauge => ("LINECARD_GAUGE", Gauge, Some("LINECARD_COUNTER_ID_LIST_GAUGE")),
    LinecardCounter => ("LINECARD_COUNTER", Counter, Some("LINECARD_COUNTER_ID_LIST_COUNTER")),
    PortStatus => ("PORT_STATUS", Status, Some("PORT_COUNTER_ID_LIST_STATUS")),
    PortGauge => ("PORT_GAUGE", Gauge, Some("PORT_COUNTER_ID_LIST_GAUGE")),
    InportGauge => ("INPORT_GAUGE", Gauge, Some("INPORT_COUNTER_ID_LIST_GAUGE")),
    OutportGauge => ("OUTPORT_GAUGE", Gauge, Some("OUTPORT_COUNTER_ID_LIST_GAUGE")),
    TransceiverStatus => ("TRANSCEIVER_STATUS", Status, Some("TRANSCEIVER_COUNTER_ID_LIST_STATUS")),
    TransceiverGauge => ("TRANSCEIVER_GAUGE", Gauge, Some("TRANSCEIVER_COUNTER_ID_LIST_GAUGE")),
    TransceiverCounter => ("TRANSCEIVER_COUNTER", Counter, Some("TRANSCEIVER_COUNTER_ID_LIST_COUNTER")),
    LogicalChStatus => ("LOGICALCH_STATUS", Status, Some("LOGICALCH_COUNTER_ID_LIST_STATUS")),
    LogicalChCounter => ("LOGICALCH_COUNTER", Counter, Some("LOGICALCH_COUNTER_ID_LIST_COUNTER")),
    OtnStatus => ("OTN_STATUS", Status, Some("OTN_COUNTER_ID_LIST_STATUS")),
    OtnGauge => ("OTN_GAUGE", Gauge, Some("OTN_COUNTER_ID_LIST_GAUGE")),
    OtnCounter => ("OTN_COUNTER", Counter, Some("OTN_COUNTER_ID_LIST_COUNTER")),
    EthernetStatus => ("ETHERNET_STATUS", Status, Some("ETHERNET_COUNTER_ID_LIST_STATUS")),
    EthernetCounter => ("ETHERNET_COUNTER", Counter, Some("ETHERNET_COUNTER_ID_LIST_COUNTER")),
    PhysicalChStatus => ("PHYSICALCH_STATUS", Status, Some("PHYSICALCH_COUNTER_ID_LIST_STATUS")),
    PhysicalChGauge => ("PHYSICALCH_GAUGE", Gauge, Some("PHYSICALCH_COUNTER_ID_LIST_GAUGE")),
    PhysicalChCounter => ("PHYSICALCH_COUNTER", Counter, Some("PHYSICALCH_COUNTER_ID_LIST_COUNTER")),
    OpticalChStatus => ("OPTICALCH_STATUS", Status, Some("OPTICALCH_COUNTER_ID_LIST_STATUS")),
    OpticalChGauge => ("OPTICALCH_GAUGE", Gauge, Some("OPTICALCH_COUNTER_ID_LIST_GAUGE")),
    OpticalChCounter => ("OPTICALCH_COUNTER", Counter, Some("OPTICALCH_COUNTER_ID_LIST_COUNTER")),
    LldpStatus => ("LLDP_STATUS", Status, Some("LLDP_COUNTER_ID_LIST_STATUS")),
    AssignmentStatus => ("ASSIGNMENT_STATUS", Status, Some("ASSIGNMENT_COUNTER_ID_LIST_STATUS")),
    InterfaceStatus => ("INTERFACE_STATUS", Status, Some("INTERFACE_COUNTER_ID_LIST_STATUS")),
    InterfaceGauge => ("INTERFACE_GAUGE", Gauge, None),
    InterfaceCounter => ("INTERFACE_COUNTER", Counter, Some("INTERFACE_COUNTER_ID_LIST_COUNTER")),
    OaStatus => ("OA_STATUS", Status, Some("OA_COUNTER_ID_LIST_STATUS")),
    OaGauge => ("OA_GAUGE", Gauge, Some("OA_COUNTER_ID_LIST_GAUGE")),
    OscStatus => ("OSC_STATUS", Status, Some("OSC_COUNTER_ID_LIST_STATUS")),
    OscGauge => ("OSC_GAUGE", Gauge, Some("OSC_COUNTER_ID_LIST_GAUGE")),
    ApsStatus => ("APS_STATUS", Status, Some("APS_COUNTER_ID_LIST_STATUS")),
    ApsPortStatus => ("APSPORT_STATUS", Status, Some("APSPORT_COUNTER_ID_LIST_STATUS")),
    ApsPortGauge => ("APSPORT_GAUGE", Gauge, Some("APSPORT_COUNTER_ID_LIST_GAUGE")),
    AttenuatorStatus => ("ATTENUATOR_STATUS", Status, Some("ATTENUATOR_COUNTER_ID_LIST_STATUS")),
    AttenuatorGauge => ("ATTENUATOR_GAUGE", Gauge, Some("ATTENUATOR_COUNTER_ID_LIST_GAUGE")),
    OcmStatus => ("OCM_STATUS", Status, Some("OCM_COUNTER_ID_LIST_STATUS")),
    OtdrStatus => ("OTDR_STATUS", Status, Some("OTDR_COUNTER_ID_LIST_STATUS")),
}

impl CounterType {
    /// Field of the FLEX_COUNTER_TABLE row carrying this type's IDs.
    pub fn id_list_field(&self) -> String {
        format!("{}_ID_LIST", self.name())
    }

    /// Resolves a manifest key such as `PORT_COUNTER_ID_LIST_STATUS`.
    pub fn from_manifest_key(key: &str) -> Option<CounterType> {
        Self::ALL.iter().copied().find(|t| t.manifest_key() == Some(key))
    }
}

impl fmt::Display for CounterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_names() {
        assert_eq!(CounterGroup::Gauge.group_name(), "1S_STAT_GAUGE");
        assert_eq!(CounterGroup::Status.stats_mode().as_str(), "STATS_MODE_STATUS");
        assert_eq!("1S_STAT_COUNTER".parse::<CounterGroup>(), Ok(CounterGroup::Counter));
        assert!("PORT_STAT_COUNTER".parse::<CounterGroup>().is_err());
    }

    #[test]
    fn test_id_list_field() {
        assert_eq!(CounterType::PortStatus.id_list_field(), "PORT_STATUS_ID_LIST");
        assert_eq!(CounterType::ApsPortGauge.id_list_field(), "APSPORT_GAUGE_ID_LIST");
    }

    #[test]
    fn test_manifest_keys() {
        assert_eq!(
            CounterType::from_manifest_key("INPORT_COUNTER_ID_LIST_GAUGE"),
            Some(CounterType::InportGauge)
        );
        assert_eq!(CounterType::from_manifest_key("PORT_COUNTER_ID_LIST_RATE"), None);
        let keyed = CounterType::ALL.iter().filter(|t| t.manifest_key().is_some()).count();
        assert_eq!(keyed, 38);
    }

    #[test]
    fn test_group_follows_class() {
        for t in CounterType::ALL {
            let suffix = match t.group() {
                CounterGroup::Gauge => "_GAUGE",
                CounterGroup::Counter => "_COUNTER",
                CounterGroup::Status => "_STATUS",
            };
            assert!(t.name().ends_with(suffix), "{} in {}", t, t.group());
        }
    }
}
