// Copyright (c) MMR Ledger Contributors
// SPDX-License-Identifier: Apache-2.0

mod test_store;
