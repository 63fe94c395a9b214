//! Optical channel monitor and OTDR attributes.

pub mod ocm {
    use crate::types::ObjectType;

    otai_attributes! {
        ObjectType::Ocm, "OTAI_OCM_ATTR_";
        ID = 0, "id", U32, CreateOnly, mandatory;
        FREQUENCY_GRANULARITY = 1, "frequency-granularity", U64, CreateAndSet;
        SCAN = 2, "scan", Bool, SetOnly, irrecoverable;
    }
}

pub mod otdr {
    use crate::types::ObjectType;

    otai_attributes! {
        ObjectType::Otdr, "OTAI_OTDR_ATTR_";
        ID = 0, "id", U32, CreateOnly, mandatory;
        REFRACTIVE_INDEX = 1, "refractive-index", Double, CreateAndSet;
        BACKSCATTER_INDEX = 2, "backscatter-index", Double, CreateAndSet;
        REFLECTION_THRESHOLD = 3, "reflection-threshold", Double, CreateAndSet;
        SPLICE_LOSS_THRESHOLD = 4, "splice-loss-threshold", Double, CreateAndSet;
        END_OF_FIBER_THRESHOLD = 5, "end-of-fiber-threshold", Double, CreateAndSet;
        DISTANCE_RANGE = 6, "distance-range", U32, CreateAndSet;
        PULSE_WIDTH = 7, "pulse-width", U32, CreateAndSet;
        AVERAGE_TIME = 8, "average-time", U32, CreateAndSet;
        OUTPUT_FREQUENCY = 9, "output-frequency", U64, CreateAndSet;
        SCAN = 10, "scan", Bool, SetOnly, irrecoverable;
    }
}
