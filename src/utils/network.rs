//! ネットワークユーティリティ
//! RFC 1071インターネットチェックサムとtcpdump風の16進ダンプを提供する

/// RFC 1071に基づくインターネットチェックサム計算
///
/// 16ビットワード単位の1の補数和を取り、最後に全体を反転する。
/// 奇数長の場合は末尾バイトを上位8ビットとして加算する。
///
/// # Examples
///
/// ```
/// use bytelayout::utils::checksum;
///
/// let data = [0x00, 0x01, 0xf2, 0x03, 0xf4, 0xf5, 0xf6, 0xf7];
/// assert_eq!(0x220d, checksum(&data));
/// ```
pub fn checksum(data: &[u8]) -> u16 {
    let mut sum: u32 = 0;
    let mut chunks = data.chunks_exact(2);
    for chunk in &mut chunks {
        sum += u16::from_be_bytes([chunk[0], chunk[1]]) as u32;
    }
    if let [last] = chunks.remainder() {
        sum += (*last as u32) << 8;
    }
    // キャリーを下位16ビットへ折り返す
    while sum >> 16 != 0 {
        sum = (sum & 0xffff) + (sum >> 16);
    }
    !(sum as u16)
}

/// tcpdump風の16進ダンプ文字列を生成する
///
/// 各行はオフセット、16バイト分の16進表現、印字可能ASCII列で構成される。
pub fn hexdump(data: &[u8]) -> String {
    let mut lines = Vec::new();
    for (index, chunk) in data.chunks(16).enumerate() {
        let hexa = chunk
            .iter()
            .map(|byte| format!("{byte:02X}"))
            .collect::<Vec<_>>()
            .join(" ");
        let text: String = chunk
            .iter()
            .map(|&byte| {
                if (0x20..0x7f).contains(&byte) {
                    byte as char
                } else {
                    '.'
                }
            })
            .collect();
        lines.push(format!("{:04x}  {hexa:<47}  {text}", index * 16));
    }
    lines.join("\n")
}
