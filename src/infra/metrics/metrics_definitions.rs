use crate::metrics;

// Storage reads.
metrics! {
    group: storage_read,

    "Time to execute storage read_account operation."
    histogram_duration storage_read_account{success},

    "Time to execute storage read_slot operation."
    histogram_duration storage_read_slot{success}
}

// Storage writes.
metrics! {
    group: storage_write,

    "Time to execute storage update_account operation."
    histogram_duration storage_update_account{success},

    "Time to execute storage remove_account operation."
    histogram_duration storage_remove_account{success},

    "Time to execute storage set_slot operation."
    histogram_duration storage_set_slot{success},

    "Time to execute storage flush operation."
    histogram_duration storage_flush{success},

    "Number of ledger writes issued by storage flush operations."
    counter storage_flush_writes{}
}
