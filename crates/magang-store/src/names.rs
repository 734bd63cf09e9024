//! Logical collection names for the back office.
//!
//! Every domain module obtains its typed handle through
//! [`crate::StoreContext::collection`] with one of these names, so the
//! physical keys stay consistent across the application. Names are
//! plain identifiers; the store adds the version prefix.

// ── peserta & sekolah ────────────────────────────────────────────────

pub const SISWA: &str = "siswa";
pub const SEKOLAH: &str = "sekolah";
pub const JURUSAN: &str = "jurusan";
pub const KELAS: &str = "kelas";
pub const PEMBIMBING: &str = "pembimbing";
pub const WALI: &str = "wali";

// ── perusahaan & penempatan ──────────────────────────────────────────

pub const PERUSAHAAN: &str = "perusahaan";
pub const DIVISI: &str = "divisi";
pub const MENTOR: &str = "mentor";
pub const LOWONGAN: &str = "lowongan";
pub const LAMARAN: &str = "lamaran";
pub const PENEMPATAN: &str = "penempatan";
pub const KONTRAK: &str = "kontrak";
pub const PERIODE: &str = "periode";
pub const GELOMBANG: &str = "gelombang";

// ── kegiatan harian ──────────────────────────────────────────────────

pub const JADWAL: &str = "jadwal";
pub const KEGIATAN: &str = "kegiatan";
pub const ABSENSI: &str = "absensi";
pub const LAPORAN: &str = "laporan";
pub const PENILAIAN: &str = "penilaian";
pub const SERTIFIKAT: &str = "sertifikat";
pub const DOKUMEN: &str = "dokumen";

// ── keuangan ─────────────────────────────────────────────────────────

pub const INVOICE: &str = "invoice";
pub const INVOICE_ITEM: &str = "invoice_item";
pub const PEMBAYARAN: &str = "pembayaran";
pub const TAGIHAN: &str = "tagihan";
pub const KWITANSI: &str = "kwitansi";
pub const REFUND: &str = "refund";
pub const DISKON: &str = "diskon";
pub const PENGELUARAN: &str = "pengeluaran";
pub const KAS: &str = "kas";
pub const JURNAL: &str = "jurnal";
pub const AKUN: &str = "akun";

// ── referensi & sistem ───────────────────────────────────────────────

pub const PROVINSI: &str = "provinsi";
pub const KOTA: &str = "kota";
pub const PENGUMUMAN: &str = "pengumuman";
pub const NOTIFIKASI: &str = "notifikasi";
pub const PENGATURAN: &str = "pengaturan";
pub const LOG_AKTIVITAS: &str = "log_aktivitas";

// ── kredensial lokal ─────────────────────────────────────────────────

pub const LOCAL_USERS: &str = "local_users";
pub const LOCAL_USER_ROLES: &str = "local_user_roles";

/// Every registered collection name.
pub const ALL: &[&str] = &[
    SISWA,
    SEKOLAH,
    JURUSAN,
    KELAS,
    PEMBIMBING,
    WALI,
    PERUSAHAAN,
    DIVISI,
    MENTOR,
    LOWONGAN,
    LAMARAN,
    PENEMPATAN,
    KONTRAK,
    PERIODE,
    GELOMBANG,
    JADWAL,
    KEGIATAN,
    ABSENSI,
    LAPORAN,
    PENILAIAN,
    SERTIFIKAT,
    DOKUMEN,
    INVOICE,
    INVOICE_ITEM,
    PEMBAYARAN,
    TAGIHAN,
    KWITANSI,
    REFUND,
    DISKON,
    PENGELUARAN,
    KAS,
    JURNAL,
    AKUN,
    PROVINSI,
    KOTA,
    PENGUMUMAN,
    NOTIFIKASI,
    PENGATURAN,
    LOG_AKTIVITAS,
    LOCAL_USERS,
    LOCAL_USER_ROLES,
];
