//! SMS over DMS (spec §4.9, NMT only): 3GPP-shaped SMS-DELIVER/SMS-SUBMIT
//! TPDUs riding an RP envelope and a non-3GPP SC-local header, carried as
//! the upper-layer payload of [`super::DmsLink`].
//!
//! Grounded on `nmt/sms.c`; address, timestamp, and 7-bit user-data codecs
//! all follow its byte-for-byte layout, cross-checked against the 42-byte
//! `test_mt_sms_data` vector in `test/test_sms.c`.

use crate::error::{DmsError, Result};
use chrono::{TimeZone, Utc};

pub const SMS_TYPE_UNKNOWN: u8 = 0x0;
pub const SMS_TYPE_INTERNATIONAL: u8 = 0x1;
pub const SMS_TYPE_NATIONAL: u8 = 0x2;

pub const SMS_PLAN_UNKNOWN: u8 = 0x0;
pub const SMS_PLAN_ISDN_TEL: u8 = 0x1;

const MTI_SMS_DELIVER: u8 = 0x00;
const MTI_SMS_SUBMIT: u8 = 0x01;
const MTI_MASK: u8 = 0x03;
const MMS_NO_MORE: u8 = 0x04;
const VPF_NOT_PRESENT: u8 = 0x00;
const VPF_MASK: u8 = 0x18;
const SRI_NO_REPORT: u8 = 0x00;

const RP_MO_DATA: u8 = 0x00;
const RP_MT_DATA: u8 = 0x01;
const RP_MT_ACK: u8 = 0x02;
const RP_MO_ACK: u8 = 0x03;
const RP_MT_ERROR: u8 = 0x04;
const RP_MO_ERROR: u8 = 0x05;
const RP_MTI_MASK: u8 = 0x07;

/// NMT Doc.450-3 1998-04-03 documents a different IE id; this is the value
/// the deployed network actually sends.
const RP_IE_USER_DATA: u8 = 0x41;
const RP_IE_CAUSE: u8 = 0x42;

/// SC-local framing prepended to every DMS payload (not part of 3GPP RP/TP).
pub const SC_HEADER: [u8; 11] = [0x01, 0x18, 0x53, 0x4d, 0x53, 0x48, 0x18, b'A', b'B', b'C', 0x02];

fn digit_value(c: char) -> Option<u8> {
    match c {
        '1'..='9' => Some(c as u8 - b'0'),
        '0' => Some(10),
        '*' => Some(11),
        '#' => Some(12),
        '+' => Some(13),
        _ => None,
    }
}

const DIGITS_TO_ASCII: [char; 16] =
    ['?', '1', '2', '3', '4', '5', '6', '7', '8', '9', '0', '*', '#', '+', '?', '?'];

/// Encode an address field: 1 length byte (semi-octet count) + type/plan
/// byte + packed digit pairs, low nibble first.
pub fn encode_address(address: &str, addr_type: u8, plan: u8) -> Vec<u8> {
    let digits: Vec<u8> = address.chars().filter_map(digit_value).collect();
    let mut out = vec![0u8, 0x80 | (addr_type << 4) | plan];
    for pair in digits.chunks(2) {
        let low = pair[0];
        let high = pair.get(1).copied().unwrap_or(0xf);
        out.push((high << 4) | low);
    }
    out[0] = digits.len() as u8;
    out
}

/// Decode `digits` semi-octets from a packed address field.
pub fn decode_address(data: &[u8], digits: usize) -> String {
    let mut out = String::with_capacity(digits);
    for i in 0..digits {
        let byte = data[i / 2];
        let nibble = if i & 1 == 0 { byte & 0xf } else { byte >> 4 };
        out.push(DIGITS_TO_ASCII[nibble as usize]);
    }
    out
}

fn bcd_pair(tens: u32, ones: u32) -> u8 {
    let t = if tens == 0 { 10 } else { tens as u8 };
    let o = if ones == 0 { 10 } else { ones as u8 };
    (o << 4) | t
}

/// Encode a TP-SCTS timestamp. `utc_offset_minutes` is the local zone's
/// offset east of UTC; the original takes this from the process's ambient
/// `localtime()`/`timezone` state, which this port replaces with an
/// explicit parameter for determinism.
pub fn encode_scts(timestamp_unix: i64, utc_offset_minutes: i32) -> [u8; 7] {
    let utc = Utc.timestamp_opt(timestamp_unix, 0).single().expect("valid unix timestamp");
    let local = utc + chrono::Duration::minutes(utc_offset_minutes as i64);

    use chrono::{Datelike, Timelike};
    let year = (local.year() % 100) as u32;
    let month = local.month();
    let day = local.day();
    let hour = local.hour();
    let min = local.minute();
    let sec = local.second();

    let quarters_signed = -(utc_offset_minutes / 15);
    let (quarters, sign) = if quarters_signed < 0 { ((-quarters_signed) as u8, 1u8) } else { (quarters_signed as u8, 0u8) };
    let zone = (quarters << 4) | (sign << 3) | (quarters >> 4);

    [
        bcd_pair(year / 10, year % 10),
        bcd_pair(month / 10, month % 10),
        bcd_pair(day / 10, day % 10),
        bcd_pair(hour / 10, hour % 10),
        bcd_pair(min / 10, min % 10),
        bcd_pair(sec / 10, sec % 10),
        zone,
    ]
}

/// Pack a plain-ASCII message 7 bits per character (not the GSM default
/// alphabet, just literal ASCII masked to 7 bits, matching `encode_userdata`).
pub fn encode_userdata_7bit(message: &str) -> Vec<u8> {
    let mut out = vec![0u8];
    let mut pos = 0u32;
    let mut count = 0u8;
    for ch in message.chars() {
        let character = if (ch as u32) < 128 { ch as u8 } else { b'?' };
        count += 1;
        if pos == 0 {
            out.push(character);
            pos = 7;
        } else {
            *out.last_mut().unwrap() |= character << pos;
            if pos > 1 {
                out.push(character >> (8 - pos));
                pos -= 1;
            } else {
                pos = 0;
            }
        }
    }
    out[0] = count;
    out
}

/// Unpack `length` bytes of 7-bit-packed user data into ASCII text.
pub fn decode_message_7bit(data: &[u8], length: usize) -> String {
    let mut fill = 0u32;
    let mut acc: u16 = 0;
    let mut out = String::new();
    for &byte in &data[..length] {
        acc |= (byte as u16) << fill;
        fill += 8;
        while fill >= 7 {
            out.push((acc & 0x7f) as u8 as char);
            acc >>= 7;
            fill -= 7;
        }
    }
    out
}

/// Build a full SC->MS SMS-DELIVER payload (header + RP + TP), ready to
/// hand to [`super::DmsLink::send`] with `eight_bits = true`.
pub fn sms_deliver_pdu(
    rp_ref: u8,
    orig_address: &str,
    orig_type: u8,
    orig_plan: u8,
    timestamp_unix: i64,
    utc_offset_minutes: i32,
    message: &str,
) -> Result<Vec<u8>> {
    if orig_address.len() > 24 {
        return Err(DmsError::MalformedPdu { reason: "originator address too long".into() }.into());
    }
    if message.len() > 140 {
        return Err(DmsError::MalformedPdu { reason: "message too long".into() }.into());
    }

    let mut data = SC_HEADER.to_vec();
    data.push(RP_MT_DATA);
    data.push(rp_ref);
    data.push(RP_IE_USER_DATA);
    let tpdu_len_pos = data.len();
    data.push(0);

    let tpdu_start = data.len();
    data.push(MTI_SMS_DELIVER | MMS_NO_MORE | VPF_NOT_PRESENT | SRI_NO_REPORT);
    data.extend(encode_address(orig_address, orig_type, orig_plan));
    data.push(0); // TP-PID
    data.push(0); // TP-DCS: 7-bit
    data.extend(encode_scts(timestamp_unix, utc_offset_minutes));
    data.extend(encode_userdata_7bit(message));

    data[tpdu_len_pos] = (data.len() - tpdu_start) as u8;
    Ok(data)
}

/// A submit report sent back after accepting (or rejecting) an MO SMS.
pub fn sms_submit_report_pdu(rp_ref: u8, error: bool) -> Vec<u8> {
    let mut data = SC_HEADER.to_vec();
    data.push(if error { RP_MO_ERROR } else { RP_MO_ACK });
    data.push(rp_ref);
    data
}

/// A decoded MS->SC SMS-SUBMIT TPDU.
#[derive(Debug, Clone, PartialEq)]
pub struct SmsSubmit {
    pub rp_ref: u8,
    pub orig_address: String,
    pub orig_type: u8,
    pub orig_plan: u8,
    pub msg_ref: u8,
    pub dest_address: String,
    pub dest_type: u8,
    pub dest_plan: u8,
    pub message: String,
}

/// Outcome of attempting to decode an accumulated RP frame (spec §4.9: DMS
/// may deliver an SMS PDU split across multiple DT frames).
pub enum RxOutcome {
    /// Not enough bytes yet.
    Incomplete,
    Submit(SmsSubmit),
    /// SC->MS delivery report (ack or RP error with optional cause).
    DeliverReport { rp_ref: u8, error: bool, cause: u8 },
    /// Mobile signalled it has nothing more to send.
    ReadyToReceive,
    Malformed,
}

/// Try to decode one complete RP frame from `buf` (no SC header: the
/// header is only present on the SC->MS direction and DMS's own upper
/// layer strips/adds it before this runs). Mirrors `dms_receive`'s
/// incremental length checks.
pub fn try_decode_rx(buf: &[u8]) -> RxOutcome {
    if buf.len() < 2 {
        return RxOutcome::Incomplete;
    }
    match buf[0] & RP_MTI_MASK {
        RP_MT_ACK | RP_MT_ERROR => decode_deliver_report(buf),
        RP_MO_DATA => decode_sms_submit(buf),
        0x07 => RxOutcome::ReadyToReceive,
        _ => RxOutcome::Malformed,
    }
}

fn decode_deliver_report(data: &[u8]) -> RxOutcome {
    let rp_ref = data[1];
    if data[0] & RP_MTI_MASK == RP_MT_ERROR {
        if data.len() < 4 {
            return RxOutcome::Incomplete;
        }
        let ie_len = data[3] as usize;
        if data.len() < 4 + ie_len {
            return RxOutcome::Incomplete;
        }
        let cause = if data[2] == RP_IE_CAUSE && data[3] > 0 { data[4] } else { 0 };
        return RxOutcome::DeliverReport { rp_ref, error: true, cause };
    }
    RxOutcome::DeliverReport { rp_ref, error: false, cause: 0 }
}

fn decode_sms_submit(full: &[u8]) -> RxOutcome {
    let rp_ref = full[1];
    let mut data = &full[2..];

    if data.len() < 2 {
        return RxOutcome::Incomplete;
    }
    let orig_digits = data[0] as usize;
    let orig_type = (data[1] >> 4) & 0x7;
    let orig_plan = data[1] & 0xf;
    let orig_len = (orig_digits + 1) / 2;
    if data.len() < 2 + orig_len {
        return RxOutcome::Incomplete;
    }
    let orig_address = decode_address(&data[2..], orig_digits);
    data = &data[2 + orig_len..];

    if data.len() < 2 {
        return RxOutcome::Incomplete;
    }
    if data[0] != RP_IE_USER_DATA {
        return RxOutcome::Malformed;
    }
    let tpdu_len = data[1] as usize;
    if data.len() < 2 + tpdu_len {
        return RxOutcome::Incomplete;
    }
    let tpdu = &data[2..2 + tpdu_len];

    decode_submit_tpdu(rp_ref, &orig_address, orig_type, orig_plan, tpdu)
}

fn decode_submit_tpdu(rp_ref: u8, orig_address: &str, orig_type: u8, orig_plan: u8, full: &[u8]) -> RxOutcome {
    let mut data = full;
    if data.is_empty() {
        return RxOutcome::Malformed;
    }
    if data[0] & MTI_MASK != MTI_SMS_SUBMIT {
        return RxOutcome::Malformed;
    }
    let vpf_present = data[0] & VPF_MASK != 0;
    data = &data[1..];

    if data.is_empty() {
        return RxOutcome::Malformed;
    }
    let msg_ref = data[0];
    data = &data[1..];

    if data.len() < 2 {
        return RxOutcome::Malformed;
    }
    let dest_digits = data[0] as usize;
    let dest_type = (data[1] >> 4) & 0x7;
    let dest_plan = data[1] & 0xf;
    let dest_len = (dest_digits + 1) / 2;
    if data.len() < 2 + dest_len {
        return RxOutcome::Malformed;
    }
    let dest_address = decode_address(&data[2..], dest_digits);
    data = &data[2 + dest_len..];

    if data.is_empty() {
        return RxOutcome::Malformed;
    }
    data = &data[1..]; // TP-PID

    if data.is_empty() {
        return RxOutcome::Malformed;
    }
    let coding = if data[0] == 0x00 {
        7
    } else if data[0] & 0xf0 == 0x30 {
        8
    } else {
        return RxOutcome::Malformed;
    };
    data = &data[1..];

    if vpf_present {
        if data.is_empty() {
            return RxOutcome::Malformed;
        }
        data = &data[1..];
    }

    if data.is_empty() {
        return RxOutcome::Malformed;
    }
    let msg_chars = data[0] as usize;
    let msg_len = if coding == 7 { (msg_chars * 7 + 7) / 8 } else { msg_chars };
    if data.len() < 1 + msg_len {
        return RxOutcome::Malformed;
    }
    let msg_data = &data[1..1 + msg_len];
    let message = if coding == 7 {
        decode_message_7bit(msg_data, msg_len)
    } else {
        String::from_utf8_lossy(msg_data).into_owned()
    };

    RxOutcome::Submit(SmsSubmit {
        rp_ref,
        orig_address: orig_address.to_string(),
        orig_type,
        orig_plan,
        msg_ref,
        dest_address,
        dest_type,
        dest_plan,
        message,
    })
}

/// Orchestrates one SMS transfer atop a [`super::DmsLink`]: reassembles the
/// RP frame out of DMS deliveries, and tracks whether this side is
/// originating (MT, i.e. SC->MS) or relaying an inbound submit (MO).
/// Mirrors `sms_t` + `dms_receive`/`dms_all_sent`.
pub struct SmsSession {
    rx_buffer: Vec<u8>,
    pub mt: bool,
    pub data_sent: bool,
}

impl Default for SmsSession {
    fn default() -> Self {
        Self { rx_buffer: Vec::new(), mt: false, data_sent: false }
    }
}

impl SmsSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Feed bytes delivered by the DMS layer; returns the decoded outcome
    /// once a full RP frame has accumulated.
    pub fn on_dms_data(&mut self, data: &[u8]) -> RxOutcome {
        if self.mt && !self.data_sent {
            return RxOutcome::Incomplete;
        }
        self.rx_buffer.extend_from_slice(data);
        let outcome = try_decode_rx(&self.rx_buffer);
        if !matches!(outcome, RxOutcome::Incomplete) {
            self.rx_buffer.clear();
        }
        outcome
    }

    /// The DMS layer has flushed all pending frames (spec's `dms_all_sent`).
    pub fn on_dms_all_sent(&mut self) {
        self.data_sent = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sms_deliver_pdu_matches_documented_test_vector() {
        let pdu = sms_deliver_pdu(1, "4948416068", SMS_TYPE_INTERNATIONAL, SMS_PLAN_ISDN_TEL, 851430904, 60, "Moin Moin").unwrap();
        let expected: [u8; 42] = [
            0x01, 0x18, 0x53, 0x4d, 0x53, 0x48, 0x18, 0x41, 0x42, 0x43, 0x02, 0x01, 0x01, 0x41, 0x1a, 0x04, 0x0a, 0x91,
            0x94, 0x84, 0x14, 0xa6, 0x86, 0x00, 0x00, 0x69, 0x21, 0x42, 0x31, 0x53, 0x4a, 0x48, 0x09, 0xcd, 0x77, 0xda,
            0x0d, 0x6a, 0xbe, 0xd3, 0x6e,
        ];
        assert_eq!(pdu, expected);
    }

    const MO_SMS_7BIT: [u8; 21] = [
        0x00, 0x00, 0x00, 0xa1, 0x41, 0x0f, 0x11, 0x00, 0x04, 0xa1, 0x8a, 0x51, 0x00, 0x00, 0xff, 0x05, 0xc8, 0x20,
        0x93, 0xf9, 0x7c,
    ];

    const MO_SMS_8BIT: [u8; 26] = [
        0x00, 0x02, 0x07, 0xa1, 0xa9, 0x62, 0x65, 0xf4, 0x41, 0x10, 0x11, 0x02, 0x03, 0xa1, 0x21, 0xf3, 0x00, 0x30,
        0xff, 0x06, 0x48, 0x61, 0x6c, 0x6c, 0x6f, 0x21,
    ];

    #[test]
    fn mo_sms_7bit_decodes_to_hallo() {
        match try_decode_rx(&MO_SMS_7BIT) {
            RxOutcome::Submit(sub) => assert_eq!(sub.message, "HALLO"),
            _ => panic!("expected a decoded submit"),
        }
    }

    #[test]
    fn mo_sms_8bit_decodes_to_hallo_bang() {
        match try_decode_rx(&MO_SMS_8BIT) {
            RxOutcome::Submit(sub) => assert_eq!(sub.message, "Hallo!"),
            _ => panic!("expected a decoded submit"),
        }
    }

    #[test]
    fn session_buffers_across_multiple_dms_deliveries_byte_by_byte() {
        let data = MO_SMS_7BIT;
        let mut session = SmsSession::new();
        let mut result = None;
        for byte in data {
            match session.on_dms_data(&[byte]) {
                RxOutcome::Incomplete => {}
                other => result = Some(other),
            }
        }
        match result {
            Some(RxOutcome::Submit(sub)) => assert_eq!(sub.message, "HALLO"),
            _ => panic!("expected submit to decode once all bytes arrived"),
        }
    }

    #[test]
    fn address_roundtrips_through_encode_and_decode() {
        let encoded = encode_address("4948416068", SMS_TYPE_INTERNATIONAL, SMS_PLAN_ISDN_TEL);
        let digits = encoded[0] as usize;
        let decoded = decode_address(&encoded[2..], digits);
        assert_eq!(decoded, "4948416068");
    }

    #[test]
    fn userdata_7bit_roundtrips() {
        let encoded = encode_userdata_7bit("Hello!");
        let count = encoded[0] as usize;
        let msg_len = (count * 7 + 7) / 8;
        let decoded = decode_message_7bit(&encoded[1..], msg_len);
        assert_eq!(decoded, "Hello!");
    }
}
